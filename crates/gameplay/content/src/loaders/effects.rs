//! Effect definition loader.

use std::path::Path;

use gameplay_core::EffectDef;

use crate::loaders::{LoadResult, read_file};

/// Loader for effect definitions from a RON list.
///
/// # RON Format
///
/// ```ron
/// [
///     (
///         id: "ge.damage.melee",
///         duration: Instant,
///         execution: Some((kind: Damage, magnitude: SetByCaller(Damage))),
///     ),
///     (
///         id: "ge.cooldown.dash",
///         duration: HasDuration(SetByCaller(Duration)),
///         granted_tags: "COOLDOWN",
///     ),
/// ]
/// ```
pub struct EffectLoader;

impl EffectLoader {
    pub fn load(path: &Path) -> LoadResult<Vec<EffectDef>> {
        let content = read_file(path)?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> LoadResult<Vec<EffectDef>> {
        ron::from_str(content).map_err(|e| anyhow::anyhow!("Failed to parse effects RON: {}", e))
    }
}

#[cfg(test)]
mod tests {
    use gameplay_core::{DurationPolicy, Magnitude, SetByCallerKey, TagSet};

    use super::*;

    #[test]
    fn parses_durations_and_tags() {
        let effects = EffectLoader::parse(
            r#"[
                (id: "ge.heal", duration: Instant,
                 execution: Some((kind: Healing, magnitude: Scalable(base: 20.0, per_level: 5.0)))),
                (id: "ge.cooldown", duration: HasDuration(SetByCaller(Duration)),
                 granted_tags: "COOLDOWN"),
            ]"#,
        )
        .unwrap();

        assert_eq!(effects.len(), 2);
        assert_eq!(effects[0].duration, DurationPolicy::Instant);
        assert_eq!(
            effects[1].duration,
            DurationPolicy::HasDuration(Magnitude::SetByCaller(SetByCallerKey::Duration))
        );
        assert_eq!(effects[1].granted_tags, TagSet::COOLDOWN);
    }

    #[test]
    fn tag_sets_read_as_flag_names() {
        let effects = EffectLoader::parse(
            r#"[
                (id: "ge.stun", duration: HasDuration(Scalable(base: 1.0, per_level: 0.0)),
                 granted_tags: "INPUT_BLOCKED | IMMUNE_TO_DAMAGE",
                 asset_tags: "DYING | DEAD"),
            ]"#,
        )
        .unwrap();

        assert_eq!(
            effects[0].granted_tags,
            TagSet::INPUT_BLOCKED | TagSet::IMMUNE_TO_DAMAGE
        );
        assert_eq!(effects[0].asset_tags, TagSet::DEAD_OR_DYING);

        let unknown = EffectLoader::parse(
            r#"[(id: "ge.bad", duration: Instant, granted_tags: "NOT_A_TAG")]"#,
        );
        assert!(unknown.is_err());
    }
}
