mod common;

mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use autolight_engine::{
        BoardConfig, ButtonConfig, Buttons, ChannelEngine, ConfigError, ConfigMode, Control,
        DirectOutput, EngineError, ExpanderBank, Instant, ModeCommand, PinState, TrySendError,
        VersionEntry,
    };
    use embedded_hal::delay::DelayNs;

    use crate::common::{
        MockBus, MockDelay, MockGpio, RecordingOutput, direct_config, expander_config,
    };

    /// Delay that queues a remote `Next` on its n-th call
    struct InterruptingDelay<'a> {
        control: &'a Control<4>,
        after: usize,
        sleeps: Rc<RefCell<Vec<u32>>>,
    }

    impl DelayNs for InterruptingDelay<'_> {
        fn delay_ns(&mut self, _ns: u32) {}

        fn delay_ms(&mut self, ms: u32) {
            let mut sleeps = self.sleeps.borrow_mut();
            sleeps.push(ms);
            if sleeps.len() == self.after {
                self.control.handle().next_mode().unwrap();
            }
        }
    }

    #[test]
    fn test_engine_idle_until_initialized() {
        let control = Control::<4>::new();
        let output = RecordingOutput::default();
        let delay = MockDelay::default();
        let mut engine = ChannelEngine::new(&control, output.clone(), delay.clone());
        engine.attach_config(direct_config(4)).unwrap();
        engine.set_init_sequence(2);

        engine.run_auto_light();

        assert!(!engine.is_ready());
        assert_eq!(output.write_count(), 0);
        assert!(delay.sleeps().is_empty());
    }

    #[test]
    fn test_initialize_requires_config() {
        let control = Control::<4>::new();
        let mut engine = ChannelEngine::new(&control, RecordingOutput::default(), MockDelay::default());
        assert_eq!(engine.initialize(), Err(EngineError::MissingConfig));
    }

    #[test]
    fn test_unresolved_topology_keeps_engine_idle() {
        let mut gpio = MockGpio::default();
        for pin in [0x1B, 0x1A, 0x19, 0x21, 0x20] {
            gpio.set_input(pin, PinState::High);
        }
        let table = [VersionEntry {
            pattern: 0b00110,
            version: 1,
            channels: 6,
        }];
        let mut config = BoardConfig::new(ConfigMode::I2cExpander)
            .with_version_table(&table)
            .unwrap();
        assert!(config.read_channel_from_address_pins(&mut gpio).is_err());

        let control = Control::<4>::new();
        let output = RecordingOutput::default();
        let mut engine = ChannelEngine::new(&control, output.clone(), MockDelay::default());
        engine.attach_config(config).unwrap();

        assert_eq!(
            engine.initialize(),
            Err(EngineError::Config(ConfigError::UnrecognizedTopology {
                pattern: 0b11111
            }))
        );
        engine.run_auto_light();
        assert_eq!(output.0.borrow().begun, 0);
        assert!(!control.handle().is_ready());
    }

    #[test]
    fn test_initialize_only_once() {
        let control = Control::<4>::new();
        let mut engine = ChannelEngine::new(&control, RecordingOutput::default(), MockDelay::default());
        engine.attach_config(direct_config(4)).unwrap();
        engine.initialize().unwrap();

        assert_eq!(engine.initialize(), Err(EngineError::AlreadyInitialized));
        assert_eq!(
            engine.attach_config(direct_config(2)),
            Err(EngineError::AlreadyInitialized)
        );
        assert_eq!(engine.config().unwrap().channel_count(), 4);
    }

    #[test]
    fn test_pending_mode_adopted_with_single_force_off() {
        let control = Control::<4>::new();
        let output = RecordingOutput::default();
        let mut engine = ChannelEngine::new(&control, output.clone(), MockDelay::default());
        engine.attach_config(direct_config(4)).unwrap();
        engine.initialize().unwrap();
        engine.set_init_sequence(3);

        engine.next_mode();
        engine.next_mode();
        engine.next_mode();
        assert_eq!(engine.state().current_mode(), 3);

        let mut adopted = Vec::new();
        engine.run_auto_light_with(|mode| adopted.push(mode));

        assert_eq!(adopted, vec![6]);
        assert_eq!(output.force_offs(), 1);
        assert_eq!(engine.get_sequence_index(), 6);
        assert!(!engine.token().is_cancelled());

        // nothing pending, nothing adopted
        engine.run_auto_light_with(|mode| adopted.push(mode));
        assert_eq!(adopted, vec![6]);
        assert_eq!(output.force_offs(), 1);
    }

    #[test]
    fn test_remote_request_interrupts_running_sequence() {
        let control = Control::<4>::new();
        let output = RecordingOutput::default();
        let sleeps = Rc::new(RefCell::new(Vec::new()));
        let delay = InterruptingDelay {
            control: &control,
            after: 3,
            sleeps: Rc::clone(&sleeps),
        };
        let mut engine = ChannelEngine::new(&control, output.clone(), delay);
        engine.attach_config(direct_config(8)).unwrap();
        engine.initialize().unwrap();
        engine.set_init_sequence(2);

        engine.run_auto_light();
        let writes = output.write_count();

        // the third sleep queued the request; nothing ran after it
        assert_eq!(sleeps.borrow().len(), 3);
        assert_eq!(engine.state().current_mode(), 2);
        assert_eq!(engine.state().pending_mode(), 3);
        assert!(engine.token().is_cancelled());

        engine.set(10, true);
        engine.sleep(100);
        assert_eq!(output.write_count(), writes);
        assert_eq!(sleeps.borrow().len(), 3);

        let mut adopted = Vec::new();
        engine.run_auto_light_with(|mode| adopted.push(mode));
        assert_eq!(adopted, vec![3]);
        assert_eq!(output.force_offs(), 1);
        assert!(sleeps.borrow().len() > 3);
    }

    #[test]
    fn test_force_off_is_idempotent() {
        let control = Control::<4>::new();
        let output = RecordingOutput::default();
        let mut engine = ChannelEngine::new(&control, output.clone(), MockDelay::default());
        engine.attach_config(direct_config(3)).unwrap();
        engine.initialize().unwrap();

        engine.on();
        assert!((0..3).all(|i| engine.channel_state(i)));

        engine.force_off();
        engine.force_off();
        assert_eq!(output.force_offs(), 2);
        assert!((0..3).all(|i| !engine.channel_state(i)));
        assert!(!engine.channel_state(7));

        engine.on();
        assert!((0..3).all(|i| engine.channel_state(i)));
        engine.off();
        assert!((0..3).all(|i| !engine.channel_state(i)));
        assert_eq!(output.force_offs(), 2);
    }

    #[test]
    fn test_retried_initialize_keeps_custom_order() {
        let control = Control::<4>::new();
        let output = RecordingOutput::default();
        output.0.borrow_mut().failing_begins = 1;
        let mut engine = ChannelEngine::new(&control, output.clone(), MockDelay::default());

        let mut config = direct_config(3);
        config.apply_custom_sequence(&[2, 3, 1]).unwrap();
        engine.attach_config(config).unwrap();

        assert!(engine.initialize().is_err());
        assert!(!engine.is_ready());
        assert_eq!(engine.config().unwrap().pins(), &[11, 12, 10]);

        engine.initialize().unwrap();
        assert_eq!(engine.config().unwrap().pins(), &[11, 12, 10]);
        assert_eq!(output.0.borrow().begun, 1);

        engine.set(11, true);
        assert!(engine.channel_state(0));
        assert!(!engine.channel_state(2));
    }

    #[test]
    fn test_status_follows_adopted_mode() {
        let control = Control::<4>::new();
        let handle = control.handle();
        let mut engine = ChannelEngine::new(&control, RecordingOutput::default(), MockDelay::default());
        engine.attach_config(direct_config(4)).unwrap();
        engine.initialize().unwrap();
        engine.set_init_sequence(3);
        assert_eq!(handle.sequence_index(), 3);
        assert!(handle.is_on());

        handle.off_mode().unwrap();
        // drains the queue without dispatching
        engine.set(10, true);
        assert!(!engine.state().is_on());
        assert_eq!(handle.sequence_index(), 3);
        assert!(handle.is_on());

        engine.run_auto_light();
        assert_eq!(handle.sequence_index(), 0);
        assert!(!handle.is_on());
    }

    #[test]
    fn test_direct_output_drives_pins_high_at_init() {
        let gpio = MockGpio::default();
        let control = Control::<4>::new();
        let mut engine =
            ChannelEngine::new(&control, DirectOutput::new(gpio.clone()), MockDelay::default());
        engine.attach_config(direct_config(3)).unwrap();
        engine.initialize().unwrap();

        for pin in [10, 11, 12] {
            assert_eq!(gpio.level(pin), Some(PinState::High));
        }
    }

    #[test]
    fn test_reversed_direct_output() {
        let gpio = MockGpio::default();
        let control = Control::<4>::new();
        let mut engine =
            ChannelEngine::new(&control, DirectOutput::new(gpio.clone()), MockDelay::default());
        engine.attach_config(direct_config(3)).unwrap();
        engine.reverse(true);
        engine.initialize().unwrap();
        engine.set_init_sequence(1);

        engine.run_auto_light();
        assert_eq!(gpio.level(10), Some(PinState::Low));
        assert!(engine.channel_state(0));

        engine.force_off();
        assert_eq!(gpio.level(12), Some(PinState::High));
        assert!(!engine.channel_state(2));
    }

    #[test]
    fn test_direct_output_rejects_expander_board() {
        let control = Control::<4>::new();
        let mut engine = ChannelEngine::new(
            &control,
            DirectOutput::new(MockGpio::default()),
            MockDelay::default(),
        );
        engine.attach_config(expander_config(8)).unwrap();
        assert_eq!(
            engine.initialize(),
            Err(EngineError::ModeMismatch {
                mode: ConfigMode::I2cExpander
            })
        );
        assert!(!engine.is_ready());
    }

    #[test]
    fn test_expander_board_end_to_end() {
        let bus = MockBus::default();
        let control = Control::<4>::new();
        let mut engine =
            ChannelEngine::new(&control, ExpanderBank::new(bus.clone()), MockDelay::default());
        engine.attach_config(expander_config(8)).unwrap();
        engine.initialize().unwrap();
        assert_eq!(bus.writes(), vec![(0x20, vec![0xFF])]);

        engine.set_init_sequence(1);
        engine.run_auto_light();
        assert_eq!(bus.last_byte_to(0x20), Some(0xFF));

        engine.reverse(true);
        engine.run_auto_light();
        assert_eq!(bus.last_byte_to(0x20), Some(0x00));
        assert!(engine.channel_state(5));

        engine.force_off();
        assert_eq!(bus.last_byte_to(0x20), Some(0xFF));
        assert_eq!(engine.output().expanders().len(), 1);
    }

    #[test]
    fn test_remote_handle_reads_published_status() {
        let control = Control::<4>::new();
        let handle = control.handle();
        let mut engine = ChannelEngine::new(&control, RecordingOutput::default(), MockDelay::default());
        engine.attach_config(direct_config(4)).unwrap();
        assert!(!handle.is_ready());
        engine.initialize().unwrap();
        assert!(handle.is_ready());

        handle.set_init_delay(10).unwrap();
        handle.change_mode_app(4).unwrap();
        engine.run_auto_light();

        assert_eq!(handle.delay_time(), 30);
        assert_eq!(engine.get_delay_time(), 30);
        assert_eq!(handle.sequence_index(), 4);
        assert!(handle.is_on());
    }

    #[test]
    fn test_full_queue_returns_command() {
        let control = Control::<2>::new();
        let handle = control.handle();
        handle.next_mode().unwrap();
        handle.off_mode().unwrap();
        assert_eq!(handle.next_mode(), Err(TrySendError(ModeCommand::Next)));

        assert_eq!(control.try_receive(), Ok(ModeCommand::Next));
        assert_eq!(control.try_receive(), Ok(ModeCommand::Off));
        assert!(control.try_receive().is_err());
    }

    #[test]
    fn test_buttons_drive_mode_changes() {
        let control = Control::<4>::new();
        let buttons = Buttons::new();
        let output = RecordingOutput::default();
        let mut engine = ChannelEngine::new(&control, output.clone(), MockDelay::default());
        engine.attach_config(direct_config(4)).unwrap();
        engine.attach_buttons(&buttons, ButtonConfig::default());
        engine.initialize().unwrap();

        // previous is ignored while off
        buttons.on_interrupt(3, Instant::from_millis(0));
        engine.run_auto_light();
        assert_eq!(engine.get_sequence_index(), 0);
        assert_eq!(output.force_offs(), 0);

        buttons.on_interrupt(0, Instant::from_millis(0));
        engine.run_auto_light();
        assert_eq!(engine.get_sequence_index(), 1);

        buttons.on_interrupt(2, Instant::from_millis(0));
        engine.run_auto_light();
        assert_eq!(engine.get_sequence_index(), 2);

        buttons.on_interrupt(1, Instant::from_millis(0));
        engine.run_auto_light();
        assert_eq!(engine.get_sequence_index(), 0);
        assert_eq!(output.force_offs(), 3);
    }

    #[test]
    fn test_off_then_on_restores_sequence() {
        let control = Control::<4>::new();
        let mut engine = ChannelEngine::new(&control, RecordingOutput::default(), MockDelay::default());
        engine.attach_config(direct_config(4)).unwrap();
        engine.initialize().unwrap();
        engine.set_init_sequence(5);

        engine.off_mode();
        engine.run_auto_light();
        assert_eq!(engine.get_sequence_index(), 0);

        engine.on_mode();
        engine.run_auto_light();
        assert_eq!(engine.get_sequence_index(), 5);

        engine.toggle_on_off();
        engine.run_auto_light();
        assert_eq!(engine.get_sequence_index(), 0);
    }

    #[test]
    fn test_active_sequence_map_through_engine() {
        let control = Control::<4>::new();
        let mut engine = ChannelEngine::new(&control, RecordingOutput::default(), MockDelay::default());
        engine.attach_config(direct_config(4)).unwrap();
        engine.initialize().unwrap();
        engine.set_active_sequences(&[1, 4, 7]);

        engine.change_mode_app(2);
        engine.run_auto_light();
        assert_eq!(engine.state().current_mode(), 7);
        assert_eq!(engine.get_sequence_index(), 2);

        assert!(engine.reorder_active_sequences(&[7, 4, 1]));
        assert_eq!(engine.get_sequence_index(), 0);
    }
}
