use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use bci_bridge::{
    Actuation, CommandBridge, CommandDispatcher, CommandRecord, DispatchConfig, DispatchOutcome,
    ManualClock, RecordingActuator, Vec3,
};

type Player = Rc<RefCell<CommandDispatcher<RecordingActuator>>>;

fn setup(config: DispatchConfig) -> (CommandBridge, Player, ManualClock) {
    let clock = ManualClock::new();
    clock.set(Duration::from_secs(30));
    let player = Rc::new(RefCell::new(
        CommandDispatcher::with_clock(config, RecordingActuator::new(), clock.clone()).unwrap(),
    ));
    let mut bridge = CommandBridge::new();
    bridge.subscribe(player.clone());
    (bridge, player, clock)
}

#[test]
fn burst_drained_in_one_tick_actuates_once() {
    let (bridge, player, _clock) = setup(DispatchConfig::default());
    let queue = bridge.queue();
    for _ in 0..5 {
        queue.push(CommandRecord::new("right", 0.9, 0)).unwrap();
    }

    assert_eq!(bridge.tick().unwrap(), 5);
    // Same instant: everything after the first hits the cooldown.
    assert_eq!(player.borrow().actuator().actuations().len(), 1);
}

#[test]
fn duplicate_subscription_does_not_double_actuate() {
    let (mut bridge, player, _clock) = setup(DispatchConfig::default());
    assert!(!bridge.subscribe(player.clone()));

    bridge
        .queue()
        .push(CommandRecord::new("push", 0.9, 0))
        .unwrap();
    bridge.tick().unwrap();
    assert_eq!(player.borrow().actuator().actuations().len(), 1);
}

#[test]
fn steady_stream_respects_cooldown_spacing() {
    let config = DispatchConfig::default().max_commands_per_second(100);
    let (bridge, player, clock) = setup(config);
    let queue = bridge.queue();
    let labels = ["left", "right"];

    // One command every 50ms for two seconds, alternating labels.
    for i in 0..40 {
        queue
            .push(CommandRecord::new(labels[i % 2], 0.9, i as i64))
            .unwrap();
        bridge.tick().unwrap();
        clock.advance(Duration::from_millis(50));
    }

    // 150ms global cooldown admits every third command.
    assert_eq!(player.borrow().actuator().actuations().len(), 14);
}

#[test]
fn rate_limit_caps_a_same_instant_burst() {
    let config = DispatchConfig::default().command_cooldown(Duration::ZERO);
    let (bridge, player, clock) = setup(config);
    let queue = bridge.queue();

    for i in 0..12 {
        queue
            .push(CommandRecord::new(if i % 2 == 0 { "push" } else { "pull" }, 0.9, i))
            .unwrap();
    }
    bridge.tick().unwrap();
    assert_eq!(player.borrow().actuator().actuations().len(), 8);

    clock.advance(Duration::from_millis(1001));
    queue.push(CommandRecord::new("push", 0.9, 12)).unwrap();
    bridge.tick().unwrap();
    assert_eq!(player.borrow().actuator().actuations().len(), 9);
}

#[test]
fn lift_gated_by_ground_contact() {
    let (bridge, player, clock) = setup(DispatchConfig::default());
    let queue = bridge.queue();

    queue.push(CommandRecord::new("lift", 1.0, 0)).unwrap();
    bridge.tick().unwrap();
    assert!(player.borrow().actuator().actuations().is_empty());

    clock.advance(Duration::from_secs(1));
    player
        .borrow_mut()
        .actuator_mut()
        .ground_mut()
        .contact_begin("Ground");
    queue.push(CommandRecord::new("lift", 1.0, 1)).unwrap();
    bridge.tick().unwrap();

    assert_eq!(
        player.borrow().actuator().actuations(),
        &[Actuation::Impulse {
            direction: Vec3::UP,
            magnitude: 12.0,
        }]
    );

    clock.advance(Duration::from_secs(1));
    player
        .borrow_mut()
        .actuator_mut()
        .ground_mut()
        .contact_end("Ground");
    assert_eq!(
        player.borrow_mut().test_command("lift", 1.0),
        DispatchOutcome::NotGrounded
    );
}

#[test]
fn direct_input_is_not_debounced() {
    let (_bridge, player, _clock) = setup(DispatchConfig::default());
    let mut player = player.borrow_mut();

    assert!(player.handle("left", 0.9).is_actuated());
    // Signal path is cooling down, manual path is not.
    assert_eq!(player.handle("right", 0.9), DispatchOutcome::CoolingDown);
    assert!(player.move_direct(Vec3::RIGHT, 1.0).is_actuated());
    assert!(player.move_direct(Vec3::RIGHT, 1.0).is_actuated());
}
