//! Ability set loader.

use std::path::Path;

use gameplay_core::AbilitySet;

use crate::loaders::{LoadResult, read_file};

/// Loader for ability sets from a RON list.
///
/// # RON Format
///
/// ```ron
/// [
///     (
///         name: "as.hero.core",
///         abilities: [
///             (ability: "ga.death"),
///             (ability: "ga.punch", input_tag: Some(Primary)),
///         ],
///         effects: [(effect: "ge.regen", level: 2.0)],
///         attribute_sets: [Ultimate],
///     ),
/// ]
/// ```
pub struct AbilitySetLoader;

impl AbilitySetLoader {
    pub fn load(path: &Path) -> LoadResult<Vec<AbilitySet>> {
        let content = read_file(path)?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> LoadResult<Vec<AbilitySet>> {
        ron::from_str(content)
            .map_err(|e| anyhow::anyhow!("Failed to parse ability sets RON: {}", e))
    }
}

#[cfg(test)]
mod tests {
    use gameplay_core::{AttributeSetKind, InputTag};

    use super::*;

    #[test]
    fn grant_levels_default_to_one() {
        let sets = AbilitySetLoader::parse(
            r#"[(
                name: "as.core",
                abilities: [(ability: "ga.death"), (ability: "ga.punch", level: 3, input_tag: Some(Primary))],
                effects: [(effect: "ge.regen")],
                attribute_sets: [Ultimate],
            )]"#,
        )
        .unwrap();

        let set = &sets[0];
        assert_eq!(set.abilities[0].level, 1);
        assert_eq!(set.abilities[1].level, 3);
        assert_eq!(set.abilities[1].input_tag, Some(InputTag::Primary));
        assert_eq!(set.effects[0].level, 1.0);
        assert_eq!(set.attribute_sets, vec![AttributeSetKind::Ultimate]);
    }
}
