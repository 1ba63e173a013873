mod common;

use std::sync::Arc;

use common::{HERO, World, system};
use gameplay_core::{
    AbilityDef, AbilitySpecHandle, AbilitySystem, ActivationFailure, ActivationGroup, NetRole,
};
use proptest::prelude::*;

#[derive(Clone, Copy, Debug)]
enum Step {
    Activate(usize),
    End(usize),
    Cancel(usize),
}

fn step() -> impl Strategy<Value = Step> {
    prop_oneof![
        (0usize..5).prop_map(Step::Activate),
        (0usize..5).prop_map(Step::End),
        (0usize..5).prop_map(Step::Cancel),
    ]
}

const GROUPS: [ActivationGroup; 5] = [
    ActivationGroup::Independent,
    ActivationGroup::ExclusiveReplaceable,
    ActivationGroup::ExclusiveReplaceable,
    ActivationGroup::ExclusiveBlocking,
    ActivationGroup::ExclusiveBlocking,
];

fn grant_all(system: &mut AbilitySystem, world: &World) -> Vec<AbilitySpecHandle> {
    let env = world.env();
    GROUPS
        .iter()
        .enumerate()
        .map(|(index, group)| {
            let def = AbilityDef::new(format!("ga.group.{index}")).with_group(*group);
            system
                .give_ability(Arc::new(def), 1, None, &env)
                .expect("grant")
        })
        .collect()
}

fn active_exclusives(system: &AbilitySystem, handles: &[AbilitySpecHandle]) -> Vec<AbilitySpecHandle> {
    handles
        .iter()
        .zip(GROUPS)
        .filter(|(handle, group)| group.is_exclusive() && system.is_active(**handle))
        .map(|(handle, _)| *handle)
        .collect()
}

proptest! {
    #[test]
    fn at_most_one_exclusive_is_active(steps in prop::collection::vec(step(), 1..60)) {
        let world = World::new();
        let env = world.env();
        let mut system = system(&world, HERO, NetRole::Authority);
        let handles = grant_all(&mut system, &world);

        for step in steps {
            let blocking_before = system.arbiter().current_group() == Some(ActivationGroup::ExclusiveBlocking);
            let current_before = system.arbiter().current();
            match step {
                Step::Activate(index) => {
                    let result = system.try_activate(handles[index], &env);
                    if blocking_before
                        && GROUPS[index].is_exclusive()
                        && current_before != Some(handles[index])
                    {
                        prop_assert_eq!(result, Err(ActivationFailure::ActivationGroupBlocked));
                    }
                }
                Step::End(index) => {
                    system.end_ability(handles[index], &env);
                }
                Step::Cancel(index) => {
                    system.cancel_ability(handles[index], &env);
                }
            }

            let active = active_exclusives(&system, &handles);
            prop_assert!(active.len() <= 1, "several exclusives active: {:?}", active);
            prop_assert_eq!(system.arbiter().current(), active.first().copied());
            if blocking_before {
                // A blocking exclusive is only ever left by ending or cancelling it.
                if let Some(current) = current_before {
                    let touched = matches!(step, Step::End(i) | Step::Cancel(i) if handles[i] == current);
                    if !touched {
                        prop_assert_eq!(system.arbiter().current(), Some(current));
                    }
                }
            }
        }
    }
}

#[test]
fn replaceable_exclusive_is_cancelled_by_the_next_one() {
    let world = World::new();
    let env = world.env();
    let mut system = system(&world, HERO, NetRole::Authority);
    let handles = grant_all(&mut system, &world);

    system.try_activate(handles[1], &env).unwrap();
    system.try_activate(handles[0], &env).unwrap();
    system.try_activate(handles[2], &env).unwrap();

    assert!(!system.is_active(handles[1]));
    assert!(system.is_active(handles[2]));
    assert!(system.is_active(handles[0]), "independent abilities are untouched");
    assert_eq!(system.arbiter().current(), Some(handles[2]));

    system.try_activate(handles[3], &env).unwrap();
    assert!(!system.is_active(handles[2]));
    assert_eq!(
        system.try_activate(handles[1], &env),
        Err(ActivationFailure::ActivationGroupBlocked)
    );
    system.end_ability(handles[3], &env);
    assert_eq!(system.arbiter().current(), None);
    system.try_activate(handles[1], &env).unwrap();
}
