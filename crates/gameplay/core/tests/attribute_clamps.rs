use gameplay_core::{
    ActiveEffectHandle, Attribute, AttributeModifier, AttributeSetKind, AttributeStore,
    ChangeCause, ModOp,
};
use proptest::prelude::*;

#[derive(Clone, Debug)]
enum Op {
    SetBase(Attribute, f32),
    Meta(Attribute, f32),
    AddModifier(Attribute, ModOp, f32),
    RemoveModifiers(u32),
}

fn stateful_attribute() -> impl Strategy<Value = Attribute> {
    prop_oneof![
        Just(Attribute::Health),
        Just(Attribute::MaxHealth),
        Just(Attribute::Overhealth),
        Just(Attribute::DamageBoost),
        Just(Attribute::DamageResistance),
        Just(Attribute::Lives),
        Just(Attribute::UltimateCharge),
    ]
}

fn meta_attribute() -> impl Strategy<Value = Attribute> {
    prop_oneof![
        Just(Attribute::Damage),
        Just(Attribute::Healing),
        Just(Attribute::OverhealthDecay),
    ]
}

fn mod_op() -> impl Strategy<Value = ModOp> {
    prop_oneof![Just(ModOp::Add), Just(ModOp::Multiply), Just(ModOp::Override)]
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        (stateful_attribute(), -500.0f32..500.0).prop_map(|(a, v)| Op::SetBase(a, v)),
        (meta_attribute(), -200.0f32..400.0).prop_map(|(a, v)| Op::Meta(a, v)),
        (stateful_attribute(), mod_op(), -3.0f32..300.0)
            .prop_map(|(a, op, v)| Op::AddModifier(a, op, v)),
        (0u32..4).prop_map(Op::RemoveModifiers),
    ]
}

fn store() -> AttributeStore {
    let mut store = AttributeStore::with_sets([
        AttributeSetKind::Health,
        AttributeSetKind::Lives,
        AttributeSetKind::Ultimate,
    ]);
    store.set_ultimate_charge_cap(100.0);
    let cause = ChangeCause::none();
    store.set_base(Attribute::MaxHealth, 100.0, &cause);
    store.set_base(Attribute::Health, 100.0, &cause);
    store.set_base(Attribute::Lives, 3.0, &cause);
    store
}

fn assert_bounds(store: &AttributeStore) {
    let health = store.get(Attribute::Health);
    let max = store.get(Attribute::MaxHealth);
    assert!(max >= 1.0, "max health {max}");
    assert!((0.0..=max).contains(&health), "health {health} outside [0, {max}]");
    assert!(store.get(Attribute::Overhealth) >= 0.0);
    assert!(store.get(Attribute::DamageBoost) >= 0.0);
    assert!((0.0..=1.0).contains(&store.get(Attribute::DamageResistance)));
    assert!(store.get(Attribute::Lives) >= 0.0);
    assert!((0.0..=100.0).contains(&store.get(Attribute::UltimateCharge)));
    for meta in [Attribute::Damage, Attribute::Healing, Attribute::OverhealthDecay] {
        assert_eq!(store.get(meta), 0.0, "{meta:?} left a residue");
    }
}

proptest! {
    #[test]
    fn clamps_hold_after_any_sequence(ops in prop::collection::vec(op(), 1..40)) {
        let mut store = store();
        let cause = ChangeCause::none();
        for op in ops {
            match op {
                Op::SetBase(attribute, value) => {
                    store.set_base(attribute, value, &cause);
                }
                Op::Meta(attribute, value) => {
                    store.execute_meta(attribute, value, &cause);
                }
                Op::AddModifier(attribute, op, magnitude) => {
                    let source = ActiveEffectHandle(magnitude.abs() as u32 % 4);
                    store.add_modifier(attribute, AttributeModifier { source, op, magnitude }, &cause);
                }
                Op::RemoveModifiers(source) => {
                    store.remove_modifiers(ActiveEffectHandle(source), &cause);
                }
            }
            assert_bounds(&store);
        }
    }

    #[test]
    fn folded_damage_never_exceeds_the_pool(
        health in 1.0f32..100.0,
        overhealth in 0.0f32..50.0,
        damage in 0.0f32..400.0,
    ) {
        let mut store = store();
        let cause = ChangeCause::none();
        store.set_base(Attribute::Health, health, &cause);
        store.set_base(Attribute::Overhealth, overhealth, &cause);

        let applied = store.execute_meta(Attribute::Damage, damage, &cause);
        prop_assert!(applied <= health + overhealth + f32::EPSILON);
        let remaining = store.get(Attribute::Health) + store.get(Attribute::Overhealth);
        prop_assert!((remaining - (health + overhealth - applied)).abs() < 1e-3);
        prop_assert_eq!(store.is_out_of_health(), store.get(Attribute::Health) <= 0.0);
    }
}

#[test]
fn out_of_health_is_reported_once_per_crossing() {
    let mut store = store();
    let cause = ChangeCause::none();
    store.take_events();

    store.execute_meta(Attribute::Damage, 150.0, &cause);
    store.execute_meta(Attribute::Damage, 10.0, &cause);
    let crossings = store
        .take_events()
        .iter()
        .filter(|event| matches!(event, gameplay_core::AttributeEvent::OutOfHealth { .. }))
        .count();
    assert_eq!(crossings, 1);

    store.execute_meta(Attribute::Healing, 10.0, &cause);
    store.execute_meta(Attribute::Damage, 10.0, &cause);
    let crossings = store
        .take_events()
        .iter()
        .filter(|event| matches!(event, gameplay_core::AttributeEvent::OutOfHealth { .. }))
        .count();
    assert_eq!(crossings, 1);
}
