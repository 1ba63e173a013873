//! The session: one authoritative server peer and one client peer per player.
//!
//! The session owns everything the core reaches through its oracles
//! (definitions, teams, game-mode properties, avatar transforms) and routes
//! what the ability systems queue:
//! - net requests and replicated state travel over the [`NetLink`]
//! - outbound effect and ultimate-charge work is applied to the target's
//!   server copy
//! - gameplay messages fan out on the [`EventBus`]; deaths cost the whole
//!   team a life
//!
//! Each [`Session::tick`] runs: client input, link delivery, time, outbound
//! routing, message handling, then flushes requests and state to the link.

use std::collections::BTreeMap;

use gameplay_content::{ContentBundle, ContentFactory};
use gameplay_core::{
    AbilityId, ActorId, Attribute, AvatarTransform, EffectApplication, EffectId, GameModeProperty,
    GameplayEnv, GameplayEventData, GameplayTag, InputTag, MessageKind, Outbound, SetByCallerKey,
    SpatialTable, TeamOracle,
};

use crate::config::SessionConfig;
use crate::error::{Result, RuntimeError};
use crate::events::{Event, EventBus, Peer, PlayerEvent, TeamEvent, Topic};
use crate::game_mode::GameModeLifecycle;
use crate::link::{Direction, LinkPayload, NetLink};
use crate::player::{InitState, Player};
use crate::teams::TeamRegistry;

/// Rounds of outbound routing per tick; effects applied in one round may
/// queue more work for the next.
const MAX_OUTBOUND_ROUNDS: usize = 8;

fn gameplay_env<'a>(
    content: &'a ContentBundle,
    teams: &'a TeamRegistry,
    spatial: &'a SpatialTable,
) -> GameplayEnv<'a> {
    GameplayEnv::with_all(
        &content.definitions,
        teams,
        &content.game_mode.properties,
        spatial,
    )
}

pub struct Session {
    config: SessionConfig,
    content: ContentBundle,
    teams: TeamRegistry,
    spatial: SpatialTable,
    players: BTreeMap<ActorId, Player>,
    game_mode: GameModeLifecycle,
    link: NetLink,
    bus: EventBus,
    tick: u64,
    next_actor: u32,
}

impl Session {
    pub fn new(config: SessionConfig, content: ContentBundle) -> Self {
        let teams = TeamRegistry::new(content.game_mode.team_count);
        let link = NetLink::new(config.latency_ticks);
        let bus = EventBus::with_capacity(config.event_buffer_size);
        Self {
            config,
            content,
            teams,
            spatial: SpatialTable::new(),
            players: BTreeMap::new(),
            game_mode: GameModeLifecycle::new(),
            link,
            bus,
            tick: 0,
            next_actor: 1,
        }
    }

    /// Loads the configured game mode's content from `config.data_dir`.
    pub fn load(config: SessionConfig) -> Result<Self> {
        let content = ContentFactory::new(&config.data_dir)
            .load_bundle(&config.game_mode)
            .map_err(RuntimeError::Content)?;
        Ok(Self::new(config, content))
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn content(&self) -> &ContentBundle {
        &self.content
    }

    pub fn teams(&self) -> &TeamRegistry {
        &self.teams
    }

    pub fn link(&self) -> &NetLink {
        &self.link
    }

    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    pub fn subscribe(&self, topic: Topic) -> tokio::sync::broadcast::Receiver<Event> {
        self.bus.subscribe(topic)
    }

    pub fn game_mode(&self) -> &GameModeLifecycle {
        &self.game_mode
    }

    pub fn current_tick(&self) -> u64 {
        self.tick
    }

    pub fn player(&self, actor: ActorId) -> Option<&Player> {
        self.players.get(&actor)
    }

    pub fn players(&self) -> impl Iterator<Item = &Player> {
        self.players.values()
    }

    // ========================================================================
    // Players
    // ========================================================================

    /// Adds a player with `pawn`, or the game mode's default pawn.
    ///
    /// The player joins the smallest team and initializes as far as the
    /// game mode allows.
    pub fn add_player(&mut self, pawn: Option<&str>) -> Result<ActorId> {
        let pawn = pawn.unwrap_or(&self.content.game_mode.default_pawn).to_owned();
        if self.content.pawn(&pawn).is_none() {
            return Err(RuntimeError::UnknownPawn(pawn));
        }
        let actor = ActorId(self.next_actor);
        self.next_actor += 1;

        let (team, previous) = self.teams.assign_balanced(actor);
        let player = Player::new(actor, team, pawn.clone(), &self.content.config);
        self.players.insert(actor, player);
        tracing::info!(%actor, %team, %pawn, "player joined");

        self.bus.publish(Event::Player(PlayerEvent::Joined { actor, pawn }));
        self.bus.publish(Event::Team(TeamEvent::Assigned {
            actor,
            team,
            previous,
        }));
        self.advance_player(actor);
        Ok(actor)
    }

    pub fn remove_player(&mut self, actor: ActorId) -> Result<()> {
        if self.players.remove(&actor).is_none() {
            return Err(RuntimeError::UnknownPlayer(actor));
        }
        self.game_mode.forget(actor);
        self.link.forget(actor);
        self.spatial.remove(actor);
        if let Some(team) = self.teams.remove(actor) {
            self.bus.publish(Event::Team(TeamEvent::Removed { actor, team }));
        }
        tracing::info!(%actor, "player left");
        self.bus.publish(Event::Player(PlayerEvent::Left { actor }));
        Ok(())
    }

    /// Moves `actor` to the position and facing of its avatar.
    pub fn place(&mut self, actor: ActorId, transform: AvatarTransform) {
        self.spatial.place(actor, transform);
    }

    /// Marks the game-mode data loaded, activates its features and lets
    /// waiting players finish initializing.
    pub fn start_game_mode(&mut self) {
        let env = gameplay_env(&self.content, &self.teams, &self.spatial);
        let activated = self.game_mode.start(&self.content, &mut self.players, &env);
        for feature in activated {
            self.bus
                .publish(Event::Player(PlayerEvent::GameFeatureActivated { feature }));
        }
        let waiting: Vec<ActorId> = self.players.keys().copied().collect();
        for actor in waiting {
            self.advance_player(actor);
        }
    }

    /// Deactivates the game mode's features, revoking what they granted.
    pub fn end_game_mode(&mut self) {
        let env = gameplay_env(&self.content, &self.teams, &self.spatial);
        let deactivated = self.game_mode.stop(&mut self.players, &env);
        for feature in deactivated {
            self.bus
                .publish(Event::Player(PlayerEvent::GameFeatureDeactivated { feature }));
        }
    }

    /// Walks `actor` up the initialization chain as far as the preconditions allow.
    fn advance_player(&mut self, actor: ActorId) {
        let env = gameplay_env(&self.content, &self.teams, &self.spatial);
        let Some(player) = self.players.get_mut(&actor) else {
            return;
        };
        while let Some(next) = player.init.next() {
            let advanced = match next {
                InitState::DataAvailable => {
                    self.game_mode.is_loaded() && self.content.pawn(&player.pawn).is_some()
                }
                InitState::DataInitialized => {
                    apply_pawn_data(&self.content, player, &env);
                    self.game_mode.grant_to(&self.content, player, &env);
                    true
                }
                InitState::GameplayReady => {
                    if self.teams.team_of(actor).is_none() {
                        false
                    } else {
                        for system in [&mut player.server, &mut player.client] {
                            system.set_avatar(Some(actor), &env);
                            system.set_gameplay_ready(true, &env);
                        }
                        true
                    }
                }
                InitState::Spawned => false,
            };
            if !advanced {
                break;
            }
            player.init = next;
            tracing::debug!(%actor, state = ?next, "player initialization advanced");
            self.bus.publish(Event::Player(PlayerEvent::InitStateChanged {
                actor,
                state: next,
            }));
        }
    }

    // ========================================================================
    // Player actions (client side)
    // ========================================================================

    pub fn press_input(&mut self, actor: ActorId, input: InputTag) -> Result<()> {
        self.ready_player_mut(actor)?.client.ability_input_pressed(input);
        Ok(())
    }

    pub fn release_input(&mut self, actor: ActorId, input: InputTag) -> Result<()> {
        self.ready_player_mut(actor)?.client.ability_input_released(input);
        Ok(())
    }

    /// Tries to activate `ability` on the player's client, predicting where allowed.
    pub fn activate(&mut self, actor: ActorId, ability: &str) -> Result<()> {
        let env = gameplay_env(&self.content, &self.teams, &self.spatial);
        let player = ready_player(&mut self.players, actor)?;
        let id = AbilityId::new(ability);
        let handle = player
            .client
            .find_ability(&id)
            .ok_or(RuntimeError::UnknownAbility { actor, ability: id })?;
        player.client.try_activate(handle, &env)?;
        Ok(())
    }

    /// Delivers an animation-driven gameplay event (e.g. a melee hit frame)
    /// to the player's client.
    pub fn animation_event(&mut self, actor: ActorId, tag: GameplayTag) -> Result<usize> {
        let env = gameplay_env(&self.content, &self.teams, &self.spatial);
        let player = ready_player(&mut self.players, actor)?;
        let payload = GameplayEventData::from_instigator(Some(actor), 0.0);
        Ok(player.client.handle_gameplay_event(tag, payload, &env))
    }

    // ========================================================================
    // Server actions
    // ========================================================================

    /// Applies `effect` from `source` to `target` on the server.
    pub fn apply_effect(
        &mut self,
        source: ActorId,
        target: ActorId,
        effect: &str,
        magnitudes: &[(SetByCallerKey, f32)],
    ) -> Result<EffectApplication> {
        let env = gameplay_env(&self.content, &self.teams, &self.spatial);
        let source_player = self
            .players
            .get(&source)
            .ok_or(RuntimeError::UnknownPlayer(source))?;
        let mut spec = source_player
            .server
            .make_outgoing_spec(&EffectId::new(effect), 1.0, &env)?;
        for &(key, value) in magnitudes {
            spec.set_set_by_caller(key, value);
        }
        let target_player = self
            .players
            .get_mut(&target)
            .ok_or(RuntimeError::UnknownPlayer(target))?;
        Ok(target_player.server.apply_effect_spec(spec, &env)?)
    }

    /// Sends the reset event to the player's server copy.
    pub fn reset_player(&mut self, actor: ActorId) -> Result<()> {
        let env = gameplay_env(&self.content, &self.teams, &self.spatial);
        let player = self
            .players
            .get_mut(&actor)
            .ok_or(RuntimeError::UnknownPlayer(actor))?;
        let payload = GameplayEventData::from_instigator(None, 0.0);
        player
            .server
            .handle_gameplay_event(GameplayTag::EventReset, payload, &env);
        Ok(())
    }

    // ========================================================================
    // Tick
    // ========================================================================

    /// Advances the whole session by one tick.
    pub fn tick(&mut self) -> Result<()> {
        let now = self.tick;
        let dt = self.config.tick_seconds();
        let env = gameplay_env(&self.content, &self.teams, &self.spatial);

        for player in self.players.values_mut() {
            player.client.process_input(&env);
        }

        for delivery in self.link.deliver(now)? {
            let Some(player) = self.players.get_mut(&delivery.owner) else {
                continue;
            };
            match (delivery.direction, delivery.payload) {
                (Direction::ToServer, LinkPayload::Request(request)) => {
                    player.server.receive(request, &env);
                }
                (Direction::ToClient, LinkPayload::Request(request)) => {
                    player.client.receive(request, &env);
                }
                (Direction::ToClient, LinkPayload::State(state)) => {
                    player.client.apply_replicated_state(&state, &env);
                }
                (Direction::ToServer, LinkPayload::State(_)) => {
                    tracing::warn!(owner = %delivery.owner, "server ignores client state");
                }
            }
        }

        for player in self.players.values_mut() {
            player.server.tick(dt, &env);
            player.client.tick(dt, &env);
        }

        route_outbound(&mut self.players, &env);
        handle_messages(&mut self.players, &self.teams, &self.bus, &env);

        for player in self.players.values_mut() {
            for request in player.client.drain_requests() {
                self.link.send(
                    now,
                    player.id,
                    Direction::ToServer,
                    &LinkPayload::Request(request),
                )?;
            }
            for request in player.server.drain_requests() {
                self.link.send(
                    now,
                    player.id,
                    Direction::ToClient,
                    &LinkPayload::Request(request),
                )?;
            }
            let state = LinkPayload::State(player.server.replicated_state());
            self.link.send(now, player.id, Direction::ToClient, &state)?;
        }

        self.tick += 1;
        Ok(())
    }

    /// Runs `ticks` ticks.
    pub fn run_for(&mut self, ticks: u64) -> Result<()> {
        for _ in 0..ticks {
            self.tick()?;
        }
        Ok(())
    }

    fn ready_player_mut(&mut self, actor: ActorId) -> Result<&mut Player> {
        ready_player(&mut self.players, actor)
    }
}

fn ready_player(players: &mut BTreeMap<ActorId, Player>, actor: ActorId) -> Result<&mut Player> {
    let player = players
        .get_mut(&actor)
        .ok_or(RuntimeError::UnknownPlayer(actor))?;
    if !player.is_ready() {
        return Err(RuntimeError::NotReady {
            actor,
            state: player.init,
        });
    }
    Ok(player)
}

/// Health, attribute sets, starting lives and pawn ability sets.
fn apply_pawn_data(content: &ContentBundle, player: &mut Player, env: &GameplayEnv<'_>) {
    let Some(pawn) = content.pawn(&player.pawn) else {
        return;
    };
    for system in [&mut player.server, &mut player.client] {
        system.init_health(pawn.health, env);
    }
    for &kind in &pawn.attribute_sets {
        player.server.add_attribute_set(kind);
    }
    if let Some(lives) = env.game_mode_property(GameModeProperty::StartingLives) {
        player.server.set_attribute_base(Attribute::Lives, lives, env);
    }
    for name in &pawn.ability_sets {
        let Some(set) = content.ability_set(name) else {
            continue;
        };
        if let Some(handles) = set.give_to(&mut player.server, None, env) {
            player.pawn_grants.push(handles);
        }
    }
}

/// Applies the work server copies queued for other owners.
fn route_outbound(players: &mut BTreeMap<ActorId, Player>, env: &GameplayEnv<'_>) {
    for _ in 0..MAX_OUTBOUND_ROUNDS {
        let work: Vec<Outbound> = players
            .values_mut()
            .flat_map(|player| player.server.drain_outbound())
            .collect();
        if work.is_empty() {
            return;
        }
        for item in work {
            match item {
                Outbound::ApplyEffect { target, spec } => {
                    let Some(player) = players.get_mut(&target) else {
                        tracing::trace!(%target, "effect target is not a player");
                        continue;
                    };
                    if let Err(err) = player.server.apply_effect_spec(spec, env) {
                        tracing::warn!(%target, "outbound effect failed: {err}");
                    }
                }
                Outbound::GrantUltimateCharge {
                    to,
                    target,
                    amount,
                    source,
                } => {
                    if let Some(player) = players.get_mut(&to) {
                        player.server.grant_ultimate_charge(target, amount, source, env);
                    }
                }
            }
        }
    }
    tracing::warn!("outbound work still queued after {MAX_OUTBOUND_ROUNDS} rounds");
}

/// Publishes every queued message and applies team lives for new deaths.
fn handle_messages(
    players: &mut BTreeMap<ActorId, Player>,
    teams: &TeamRegistry,
    bus: &EventBus,
    env: &GameplayEnv<'_>,
) {
    let mut deaths = Vec::new();
    for player in players.values_mut() {
        for message in player.server.drain_messages() {
            if matches!(message.kind, MessageKind::DeathStarted { .. }) {
                deaths.push(message.owner);
            }
            bus.publish(Event::Gameplay {
                peer: Peer::Server,
                message,
            });
        }
        for message in player.client.drain_messages() {
            bus.publish(Event::Gameplay {
                peer: Peer::Client,
                message,
            });
        }
    }

    for died in deaths {
        let Some(team) = teams.team_of(died) else {
            continue;
        };
        for member in teams.members_of(team) {
            if let Some(player) = players.get_mut(&member) {
                player.server.lose_life(env);
            }
        }
        tracing::debug!(%died, %team, "team lost a life");
        bus.publish(Event::Team(TeamEvent::LifeLost { team, died }));
    }

    // Lives changes queue attribute messages of their own.
    for player in players.values_mut() {
        for message in player.server.drain_messages() {
            bus.publish(Event::Gameplay {
                peer: Peer::Server,
                message,
            });
        }
    }
}
