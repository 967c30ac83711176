use crate::battle::calculators::{calculate_attack_outcome, confusion_self_hit};
use crate::battle::commands::execute_command_batch;
use crate::battle::conditions::{VolatileCondition, VolatileKind};
use crate::battle::effects::immune_to_weather_damage;
use crate::battle::state::{
    ActionFailureReason, BattleEvent, BattleState, EventBus, GameState, SideId, TurnRng,
};
use crate::battle::stats::effective_speed;
use crate::pokemon::StatusCondition;
use crate::trainer::Action;
use std::collections::VecDeque;

/// The move actually being executed: a slot of the attacker's move list,
/// or the struggle fallback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UsedMove {
    Slot(usize),
    Struggle,
}

/// Atomic resolution steps. One trainer action becomes one of these;
/// multi-hit continuations and confusion self-hits are injected as extras.
#[derive(Debug, Clone)]
pub enum BattleAction {
    Forfeit {
        side: SideId,
    },
    Switch {
        side: SideId,
        target_slot: usize,
    },
    AttackHit {
        attacker: SideId,
        defender: SideId,
        used: UsedMove,
        hit_number: u8,
    },
}

/// Execution queue for one turn's actions.
pub struct ActionStack {
    actions: VecDeque<BattleAction>,
}

impl ActionStack {
    pub fn new() -> Self {
        Self {
            actions: VecDeque::new(),
        }
    }

    pub fn push_back(&mut self, action: BattleAction) {
        self.actions.push_back(action);
    }

    pub fn push_front(&mut self, action: BattleAction) {
        self.actions.push_front(action);
    }

    pub fn pop_front(&mut self) -> Option<BattleAction> {
        self.actions.pop_front()
    }

    /// Build the turn's initial queue from both submitted actions, in
    /// resolution order.
    pub fn build_initial(state: &BattleState, rng: &mut TurnRng) -> Self {
        let submitted: Vec<(SideId, Action)> = SideId::BOTH
            .iter()
            .filter_map(|side| state.action_queue[side.index()].map(|action| (*side, action)))
            .collect();

        let ordered = determine_action_order(state, submitted, rng);

        let mut stack = Self::new();
        for (side, action) in ordered {
            stack.push_back(convert_action(side, action, state));
        }
        stack
    }
}

impl Default for ActionStack {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Copy)]
struct ActionPrecedence {
    /// Forfeits resolve before switches, switches before moves.
    action_class: i8,
    move_priority: i8,
    speed: u16,
}

fn precedence_of(state: &BattleState, side: SideId, action: Action) -> ActionPrecedence {
    match action {
        Action::Forfeit => ActionPrecedence {
            action_class: 10,
            move_priority: 0,
            speed: 0,
        },
        Action::Switch { .. } => ActionPrecedence {
            action_class: 6,
            move_priority: 0,
            speed: 0,
        },
        Action::Move { slot } => {
            let trainer = state.trainer(side);
            let move_priority = trainer
                .active()
                .and_then(|p| p.move_slot(slot))
                .map(|s| s.data.priority)
                .unwrap_or(0);
            let speed = trainer
                .active()
                .map(|p| effective_speed(p, trainer))
                .unwrap_or(0);
            ActionPrecedence {
                action_class: 0,
                move_priority,
                speed,
            }
        }
    }
}

/// Order the submitted actions: action class, then declared move priority,
/// then effective speed (inverted under Trick Room). A full tie goes to a
/// dedicated oracle roll, so a fixed seed yields a fixed order.
pub fn determine_action_order(
    state: &BattleState,
    mut submitted: Vec<(SideId, Action)>,
    rng: &mut TurnRng,
) -> Vec<(SideId, Action)> {
    if submitted.len() < 2 {
        return submitted;
    }

    let a = precedence_of(state, submitted[0].0, submitted[0].1);
    let b = precedence_of(state, submitted[1].0, submitted[1].1);

    let first_is_a = if a.action_class != b.action_class {
        a.action_class > b.action_class
    } else if a.move_priority != b.move_priority {
        a.move_priority > b.move_priority
    } else if a.speed != b.speed {
        if state.field.trick_room_active() {
            a.speed < b.speed
        } else {
            a.speed > b.speed
        }
    } else {
        rng.next_outcome("Speed Tie") <= 50
    };

    if !first_is_a {
        submitted.swap(0, 1);
    }
    submitted
}

/// Lower a submitted trainer action into an executable step. A move slot
/// with no PP left falls back to Struggle here, whatever the submission
/// path said.
fn convert_action(side: SideId, action: Action, state: &BattleState) -> BattleAction {
    match action {
        Action::Forfeit => BattleAction::Forfeit { side },
        Action::Switch { slot } => BattleAction::Switch {
            side,
            target_slot: slot,
        },
        Action::Move { slot } => {
            let used = state
                .trainer(side)
                .active()
                .and_then(|p| p.move_slot(slot))
                .map(|s| {
                    if s.pp > 0 {
                        UsedMove::Slot(slot)
                    } else {
                        UsedMove::Struggle
                    }
                })
                .unwrap_or(UsedMove::Struggle);

            BattleAction::AttackHit {
                attacker: side,
                defender: side.other(),
                used,
                hit_number: 0,
            }
        }
    }
}

/// Resolve one complete turn (or a mid-turn replacement) against the
/// submitted actions, consuming the turn's RNG oracle. Returns every
/// event that occurred, in order.
pub fn resolve_turn(state: &mut BattleState, mut rng: TurnRng) -> EventBus {
    let mut bus = EventBus::new();

    let replacement_phase = matches!(
        state.game_state,
        GameState::WaitingForChallengerSwap
            | GameState::WaitingForOpponentSwap
            | GameState::WaitingForBothSwaps
    );

    if replacement_phase {
        resolve_replacement_phase(state, &mut bus);
        return bus;
    }

    initialize_turn(state, &mut bus);

    let mut stack = ActionStack::build_initial(state, &mut rng);
    let mut pending: Vec<BattleAction> = Vec::new();

    while let Some(action) = stack.pop_front() {
        execute_battle_action(action, state, &mut bus, &mut pending, &mut rng);

        // Injected follow-ups (multi-hits, confusion self-damage) run next.
        for injected in pending.drain(..).rev() {
            stack.push_front(injected);
        }

        if state.game_state != GameState::TurnInProgress {
            break;
        }
    }

    if state.game_state == GameState::TurnInProgress {
        execute_end_turn_phase(state, &mut bus, &mut rng);
    }

    finalize_turn(state, &mut bus);

    log::debug!(
        "battle {} turn resolved: {} events, state {:?}",
        state.battle_id,
        bus.len(),
        state.game_state
    );

    bus
}

fn initialize_turn(state: &mut BattleState, bus: &mut EventBus) {
    state.game_state = GameState::TurnInProgress;
    bus.push(BattleEvent::TurnStarted {
        turn_number: state.turn_number,
    });

    // Mega evolution triggers before anything else moves, so the upgraded
    // speed decides this turn's order. Challenger announces first on a
    // simultaneous mega.
    for side in SideId::BOTH {
        let is_move = matches!(
            state.action_queue[side.index()],
            Some(Action::Move { .. })
        );
        let trainer = state.trainer_mut(side);
        if !is_move || !trainer.mega_armed || trainer.mega_spent {
            trainer.mega_armed = false;
            continue;
        }
        let evolved = trainer
            .active_mut()
            .and_then(|p| p.mega_evolve().map(|old| (old, p.species.clone())));
        match evolved {
            Some((old_species, new_species)) => {
                trainer.consume_mega();
                bus.push(BattleEvent::MegaEvolved {
                    side,
                    old_species,
                    new_species,
                });
            }
            None => trainer.mega_armed = false,
        }
    }
}

pub fn execute_battle_action(
    action: BattleAction,
    state: &mut BattleState,
    bus: &mut EventBus,
    pending: &mut Vec<BattleAction>,
    rng: &mut TurnRng,
) {
    match action {
        BattleAction::Forfeit { side } => execute_forfeit(side, state, bus),
        BattleAction::Switch { side, target_slot } => {
            execute_switch(side, target_slot, state, bus)
        }
        BattleAction::AttackHit {
            attacker,
            defender,
            used,
            hit_number,
        } => execute_attack_hit(attacker, defender, used, hit_number, state, bus, pending, rng),
    }
}

fn execute_forfeit(side: SideId, state: &mut BattleState, bus: &mut EventBus) {
    let winner = side.other();
    state.game_state = GameState::win_state_for(winner);
    bus.push(BattleEvent::Forfeited { side });
    bus.push(BattleEvent::BattleEnded {
        winner: Some(winner),
    });
}

fn execute_switch(side: SideId, target_slot: usize, state: &mut BattleState, bus: &mut EventBus) {
    let trainer = state.trainer_mut(side);

    // Trapping is re-checked at execution time; the trapping move may have
    // landed after this switch was validated.
    let leaving_voluntarily = trainer.active().map(|p| !p.is_fainted()).unwrap_or(false);
    if leaving_voluntarily && trainer.has_volatile(VolatileKind::Trapped) {
        bus.push(BattleEvent::ActionFailed {
            reason: ActionFailureReason::IsTrapped,
        });
        return;
    }

    let target_ok = trainer
        .party
        .get(target_slot)
        .and_then(|slot| slot.as_ref())
        .map(|p| !p.is_fainted())
        .unwrap_or(false);
    if !target_ok || target_slot == trainer.active_index {
        bus.push(BattleEvent::ActionFailed {
            reason: ActionFailureReason::CreatureFainted,
        });
        return;
    }

    let old_pokemon = trainer
        .active()
        .map(|p| p.name.clone())
        .unwrap_or_else(|| "nothing".to_string());
    // Slot occupancy was checked just above.
    trainer.switch_to(target_slot).expect("switch target verified");
    let new_pokemon = trainer
        .active()
        .map(|p| p.name.clone())
        .expect("freshly switched-in creature");

    bus.push(BattleEvent::Switched {
        side,
        old_pokemon,
        new_pokemon,
    });
}

#[allow(clippy::too_many_arguments)]
fn execute_attack_hit(
    attacker: SideId,
    defender: SideId,
    used: UsedMove,
    hit_number: u8,
    state: &mut BattleState,
    bus: &mut EventBus,
    pending: &mut Vec<BattleAction>,
    rng: &mut TurnRng,
) {
    // A fainted attacker cannot act (it was knocked out earlier this turn).
    let attacker_fainted = state
        .trainer(attacker)
        .active()
        .map(|p| p.is_fainted())
        .unwrap_or(true);
    if attacker_fainted {
        bus.push(BattleEvent::ActionFailed {
            reason: ActionFailureReason::CreatureFainted,
        });
        return;
    }

    // Multi-hit sequences stop silently once the target is down.
    if hit_number > 0 {
        let defender_down = state
            .trainer(defender)
            .active()
            .map(|p| p.is_fainted())
            .unwrap_or(true);
        if defender_down {
            return;
        }
    }

    if hit_number == 0 {
        if action_prevented(attacker, state, bus, pending, rng) {
            return;
        }

        // Spend PP and remember the slot for Disable. Struggle costs nothing.
        if let UsedMove::Slot(slot) = used {
            let trainer = state.trainer_mut(attacker);
            if let Some(pokemon) = trainer.active_mut() {
                if pokemon.spend_pp(slot).is_err() {
                    bus.push(BattleEvent::ActionFailed {
                        reason: ActionFailureReason::NoPpRemaining,
                    });
                    return;
                }
            }
            trainer.last_move_slot = Some(slot);
        }
    }

    // Offensive moves need a standing target; pure status moves do not.
    let defender_down = state
        .trainer(defender)
        .active()
        .map(|p| p.is_fainted())
        .unwrap_or(true);
    if defender_down {
        let is_damaging = match &used {
            UsedMove::Struggle => true,
            UsedMove::Slot(slot) => state
                .trainer(attacker)
                .active()
                .and_then(|p| p.move_slot(*slot))
                .map(|s| s.data.is_damaging())
                .unwrap_or(false),
        };
        if is_damaging {
            bus.push(BattleEvent::ActionFailed {
                reason: ActionFailureReason::NoTargetPresent,
            });
            return;
        }
    }

    let commands = calculate_attack_outcome(state, attacker, defender, &used, hit_number, rng);
    if let Err(e) = execute_command_batch(commands, state, bus, pending) {
        log::error!(
            "battle {}: command execution failed during attack: {:?}",
            state.battle_id,
            e
        );
    }
}

/// The gauntlet of conditions that can stop a creature from acting, in
/// check order. Emits the failure narration itself and returns true when
/// the action is prevented.
fn action_prevented(
    side: SideId,
    state: &mut BattleState,
    bus: &mut EventBus,
    pending: &mut Vec<BattleAction>,
    rng: &mut TurnRng,
) -> bool {
    let Some(name) = state.trainer(side).active().map(|p| p.name.clone()) else {
        return false;
    };

    // Sleep: count down on each attempt to act; wake at zero.
    if let Some(StatusCondition::Sleep(turns)) =
        state.trainer(side).active().and_then(|p| p.status)
    {
        if let Some(pokemon) = state.trainer_mut(side).active_mut() {
            if turns > 0 {
                pokemon.status = Some(StatusCondition::Sleep(turns - 1));
                bus.push(BattleEvent::ActionFailed {
                    reason: ActionFailureReason::IsAsleep,
                });
                return true;
            }
            pokemon.status = None;
            bus.push(BattleEvent::StatusRemoved {
                target: name.clone(),
                status: StatusCondition::Sleep(0),
            });
        }
    }

    // Freeze: 20% chance to thaw on each attempt.
    if matches!(
        state.trainer(side).active().and_then(|p| p.status),
        Some(StatusCondition::Freeze)
    ) {
        if rng.next_outcome("Thaw Check") <= 20 {
            if let Some(pokemon) = state.trainer_mut(side).active_mut() {
                pokemon.status = None;
            }
            bus.push(BattleEvent::StatusRemoved {
                target: name.clone(),
                status: StatusCondition::Freeze,
            });
        } else {
            bus.push(BattleEvent::ActionFailed {
                reason: ActionFailureReason::IsFrozen,
            });
            return true;
        }
    }

    // Flinch lasts exactly one action attempt.
    if state
        .trainer_mut(side)
        .remove_volatile(VolatileKind::Flinched)
        .is_some()
    {
        bus.push(BattleEvent::ActionFailed {
            reason: ActionFailureReason::IsFlinching,
        });
        return true;
    }

    // Paralysis: 25% full paralysis.
    if matches!(
        state.trainer(side).active().and_then(|p| p.status),
        Some(StatusCondition::Paralysis)
    ) && rng.next_outcome("Full Paralysis Check") <= 25
    {
        bus.push(BattleEvent::ActionFailed {
            reason: ActionFailureReason::IsParalyzed,
        });
        return true;
    }

    // Confusion: 50% to strike yourself instead.
    if let Some(VolatileCondition::Confused { turns_remaining }) = state
        .trainer(side)
        .volatile(VolatileKind::Confused)
        .cloned()
    {
        if turns_remaining > 0 && rng.next_outcome("Confusion Check") <= 50 {
            bus.push(BattleEvent::ActionFailed {
                reason: ActionFailureReason::IsConfused,
            });
            let commands = confusion_self_hit(state, side);
            if let Err(e) = execute_command_batch(commands, state, bus, pending) {
                log::error!("confusion self-hit failed: {:?}", e);
            }
            return true;
        }
    }

    false
}

/// End-of-turn bookkeeping: status damage, volatile ticks, trap chip,
/// weather chip and expiry, field-effect expiry.
fn execute_end_turn_phase(state: &mut BattleState, bus: &mut EventBus, rng: &mut TurnRng) {
    use schema::Ability;

    for side in SideId::BOTH {
        // 1. Primary status damage (burn, poison, toxic escalation).
        let trainer = state.trainer_mut(side);
        if let Some(pokemon) = trainer.active_mut() {
            if !pokemon.is_fainted() && pokemon.ability != Ability::MagicGuard {
                let (damage, next_status) = pokemon.status_damage();
                if damage > 0 {
                    let status = pokemon.status.expect("status damage implies a status");
                    let fainted = pokemon.take_damage(damage);
                    bus.push(BattleEvent::StatusDamage {
                        target: pokemon.name.clone(),
                        status,
                        damage,
                        remaining_hp: pokemon.current_hp(),
                    });
                    pokemon.status = next_status;
                    if fainted {
                        let name = pokemon.name.clone();
                        bus.push(BattleEvent::Fainted {
                            side,
                            pokemon: name,
                        });
                    }
                }
            }
        }

        // 2. Trap chip damage while the binding lasts.
        let trainer = state.trainer_mut(side);
        let trapped = trainer.has_volatile(VolatileKind::Trapped);
        if trapped {
            if let Some(pokemon) = trainer.active_mut() {
                if !pokemon.is_fainted() && pokemon.ability != Ability::MagicGuard {
                    let damage = (pokemon.max_hp() / 16).max(1);
                    let fainted = pokemon.take_damage(damage);
                    bus.push(BattleEvent::VolatileDamage {
                        target: pokemon.name.clone(),
                        kind: VolatileKind::Trapped,
                        damage,
                        remaining_hp: pokemon.current_hp(),
                    });
                    if fainted {
                        let name = pokemon.name.clone();
                        bus.push(BattleEvent::Fainted {
                            side,
                            pokemon: name,
                        });
                    }
                }
            }
        }

        // 3. Volatile countdowns.
        tick_volatiles(side, state, bus, rng);
    }

    // 4. Weather chip damage, then field-effect countdowns.
    if let Some((weather, _)) = state.field.weather {
        if weather.deals_chip_damage() {
            for side in SideId::BOTH {
                let trainer = state.trainer_mut(side);
                if let Some(pokemon) = trainer.active_mut() {
                    if !pokemon.is_fainted() && !immune_to_weather_damage(weather, pokemon) {
                        let damage = (pokemon.max_hp() / 16).max(1);
                        let fainted = pokemon.take_damage(damage);
                        bus.push(BattleEvent::WeatherDamage {
                            target: pokemon.name.clone(),
                            weather,
                            damage,
                            remaining_hp: pokemon.current_hp(),
                        });
                        if fainted {
                            let name = pokemon.name.clone();
                            bus.push(BattleEvent::Fainted {
                                side,
                                pokemon: name,
                            });
                        }
                    }
                }
            }
        }
    }

    if let Some((weather, turns)) = state.field.weather {
        if turns <= 1 {
            state.field.weather = None;
            bus.push(BattleEvent::WeatherEnded { weather });
        } else {
            state.field.weather = Some((weather, turns - 1));
        }
    }

    if let Some(turns) = state.field.trick_room {
        if turns <= 1 {
            state.field.trick_room = None;
            bus.push(BattleEvent::TrickRoomEnded);
        } else {
            state.field.trick_room = Some(turns - 1);
        }
    }
}

fn tick_volatiles(side: SideId, state: &mut BattleState, bus: &mut EventBus, rng: &mut TurnRng) {
    let name = match state.trainer(side).active() {
        Some(p) => p.name.clone(),
        None => return,
    };

    let mut expired: Vec<VolatileKind> = Vec::new();
    let mut rampage_ended = false;

    let trainer = state.trainer_mut(side);
    for (kind, condition) in trainer.volatiles.iter_mut() {
        match condition {
            VolatileCondition::Confused { turns_remaining }
            | VolatileCondition::Trapped { turns_remaining }
            | VolatileCondition::Disabled { turns_remaining, .. } => {
                *turns_remaining = turns_remaining.saturating_sub(1);
                if *turns_remaining == 0 {
                    expired.push(*kind);
                }
            }
            VolatileCondition::Rampaging { turns_remaining, .. } => {
                *turns_remaining = turns_remaining.saturating_sub(1);
                if *turns_remaining == 0 {
                    expired.push(VolatileKind::Rampaging);
                    rampage_ended = true;
                }
            }
            VolatileCondition::Flinched
            | VolatileCondition::Charging { .. }
            | VolatileCondition::Substitute { .. } => {}
        }
    }

    // Flinch never outlives the turn it was inflicted.
    trainer.remove_volatile(VolatileKind::Flinched);

    for kind in expired {
        trainer.remove_volatile(kind);
        bus.push(BattleEvent::VolatileExpired {
            target: name.clone(),
            kind,
        });
    }

    // A rampage that runs its course leaves the user confused.
    if rampage_ended {
        let turns = 2 + rng.next_outcome("Post-Rampage Confusion Length") % 3;
        trainer.add_volatile(VolatileCondition::Confused {
            turns_remaining: turns,
        });
        bus.push(BattleEvent::VolatileApplied {
            target: name,
            kind: VolatileKind::Confused,
        });
    }
}

fn finalize_turn(state: &mut BattleState, bus: &mut EventBus) {
    // Clear field-scoped state of anything that fainted this turn.
    for side in SideId::BOTH {
        let trainer = state.trainer_mut(side);
        if trainer.active().map(|p| p.is_fainted()).unwrap_or(false) {
            trainer.clear_active_state();
        }
    }

    check_win_conditions(state, bus);

    if state.game_state == GameState::TurnInProgress {
        state.turn_number += 1;
        state.game_state = GameState::WaitingForActions;
        check_for_pending_replacements(state);
    }

    state.action_queue = [None, None];
    bus.push(BattleEvent::TurnEnded);
}

/// A side whose active creature fainted with bench remaining must swap
/// before the next turn; this overrides the default next state.
fn check_for_pending_replacements(state: &mut BattleState) {
    let needs_swap = |side: SideId| -> bool {
        let trainer = state.trainer(side);
        trainer.active().map(|p| p.is_fainted()).unwrap_or(false) && trainer.has_usable_pokemon()
    };

    let challenger = needs_swap(SideId::Challenger);
    let opponent = needs_swap(SideId::Opponent);

    state.game_state = match (challenger, opponent) {
        (true, true) => GameState::WaitingForBothSwaps,
        (true, false) => GameState::WaitingForChallengerSwap,
        (false, true) => GameState::WaitingForOpponentSwap,
        (false, false) => return,
    };
}

fn check_win_conditions(state: &mut BattleState, bus: &mut EventBus) {
    if state.game_state.is_terminal() {
        return;
    }

    let challenger_alive = state.trainer(SideId::Challenger).has_usable_pokemon();
    let opponent_alive = state.trainer(SideId::Opponent).has_usable_pokemon();

    match (challenger_alive, opponent_alive) {
        (false, false) => {
            state.game_state = GameState::Draw;
            bus.push(BattleEvent::BattleEnded { winner: None });
        }
        (false, true) => {
            state.game_state = GameState::OpponentWin;
            bus.push(BattleEvent::TrainerDefeated {
                side: SideId::Challenger,
            });
            bus.push(BattleEvent::BattleEnded {
                winner: Some(SideId::Opponent),
            });
        }
        (true, false) => {
            state.game_state = GameState::ChallengerWin;
            bus.push(BattleEvent::TrainerDefeated {
                side: SideId::Opponent,
            });
            bus.push(BattleEvent::BattleEnded {
                winner: Some(SideId::Challenger),
            });
        }
        (true, true) => {}
    }
}

/// Mid-turn interrupt: only switch actions are honored, the turn counter
/// does not advance, and normal flow resumes once every required swap is
/// in.
fn resolve_replacement_phase(state: &mut BattleState, bus: &mut EventBus) {
    for side in SideId::BOTH {
        if let Some(Action::Switch { slot }) = state.action_queue[side.index()] {
            execute_switch(side, slot, state, bus);
        }
    }

    check_win_conditions(state, bus);

    if !state.game_state.is_terminal() {
        state.game_state = GameState::WaitingForActions;
    }
    state.action_queue = [None, None];
}
