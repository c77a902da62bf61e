//! Nearest-preceding-declaration association.

use crate::models::{Declaration, Example};

/// Index of the declaration closest above `line`.
///
/// Only declarations strictly above the line qualify. On equal distance the
/// declaration scanned first wins.
pub fn nearest_preceding(line: u32, declarations: &[Declaration]) -> Option<usize> {
    let mut closest = None;
    let mut min_distance = u32::MAX;

    for (index, decl) in declarations.iter().enumerate() {
        if decl.line() < line {
            let distance = line - decl.line();
            if distance < min_distance {
                min_distance = distance;
                closest = Some(index);
            }
        }
    }

    closest
}

/// Set the parent of every example to its nearest preceding declaration.
pub fn associate(examples: &mut [Example], declarations: &[Declaration]) {
    for example in examples.iter_mut() {
        example.parent = nearest_preceding(example.line(), declarations);
    }
}

/// Examples whose parent has the same name and kind as `declaration`.
pub fn examples_for<'a>(
    declaration: &Declaration,
    examples: &'a [Example],
    declarations: &[Declaration],
) -> Vec<&'a Example> {
    examples
        .iter()
        .filter(|example| {
            example
                .parent
                .and_then(|index| declarations.get(index))
                .is_some_and(|parent| parent.same_as(declaration))
        })
        .collect()
}
