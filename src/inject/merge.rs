use std::collections::HashMap;

use super::{BindingSet, ServiceKey};

/// Combines two binding sets; `overrides` wins every key both define.
///
/// Precedence is positional: callers pass the general set first and the
/// specialized one second. The result keeps `base` order, with overridden
/// entries replaced in place, followed by the keys only `overrides` defines.
/// Neither input is modified.
pub fn merge(base: &BindingSet, overrides: &BindingSet) -> BindingSet {
    let replacements: HashMap<ServiceKey, usize> = overrides
        .iter()
        .enumerate()
        .map(|(index, binding)| (binding.key(), index))
        .collect();
    let override_bindings: Vec<_> = overrides.iter().collect();

    let mut bindings = Vec::with_capacity(base.len() + overrides.len());
    for binding in base {
        match replacements.get(&binding.key()) {
            Some(&index) => {
                let replacement = override_bindings[index];
                log::debug!(
                    "{} overrides {}: {} -> {}",
                    overrides.name(),
                    binding.key(),
                    binding.implementation(),
                    replacement.implementation()
                );
                bindings.push(replacement.clone());
            }
            None => bindings.push(binding.clone()),
        }
    }
    for binding in overrides {
        if !base.contains(binding.key()) {
            bindings.push(binding.clone());
        }
    }

    BindingSet::from_parts(format!("{}+{}", base.name(), overrides.name()), bindings)
}

/// Folds `sets` left to right with [`merge`], so later sets take precedence.
pub fn merge_all<'a, I>(sets: I) -> BindingSet
where
    I: IntoIterator<Item = &'a BindingSet>,
{
    let mut sets = sets.into_iter();
    let Some(first) = sets.next() else {
        return BindingSet::empty("empty");
    };
    sets.fold(first.clone(), |merged, next| merge(&merged, next))
}
