mod common;

mod tests {
    use autolight_engine::config::{DEFAULT_ADDRESS_PINS, default_version_table};
    use autolight_engine::{
        BoardConfig, ConfigError, ConfigMode, PinMode, PinState, VersionEntry, derive_io_size,
    };

    use crate::common::{MockGpio, direct_config};

    const SIX_CHANNEL_BOARD: [VersionEntry; 2] = [
        VersionEntry {
            pattern: 0b01010,
            version: 1,
            channels: 6,
        },
        VersionEntry {
            pattern: 0b11111,
            version: 1,
            channels: 2,
        },
    ];

    fn jumpers(gpio: &MockGpio, pattern: u8) {
        for (bit, pin) in DEFAULT_ADDRESS_PINS.iter().enumerate() {
            let high = pattern & (1 << (4 - bit)) != 0;
            gpio.set_input(*pin, PinState::from(high));
        }
    }

    #[test]
    fn test_default_table_maps_pattern_to_channels() {
        let table = default_version_table();
        assert_eq!(table.len(), 32);
        for entry in &table {
            assert_eq!(entry.channels, (32 - entry.pattern) * 2);
        }
        assert_eq!(table.iter().find(|e| e.pattern == 0).unwrap().channels, 64);
        assert_eq!(table.iter().find(|e| e.pattern == 31).unwrap().channels, 2);
    }

    #[test]
    fn test_read_channel_from_address_pins() {
        let mut gpio = MockGpio::default();
        jumpers(&gpio, 0b01010);
        let mut config = BoardConfig::new(ConfigMode::I2cExpander)
            .with_version_table(&SIX_CHANNEL_BOARD)
            .unwrap();

        assert_eq!(config.read_channel_from_address_pins(&mut gpio), Ok(6));
        assert_eq!(config.channel_count(), 6);
        assert_eq!(config.io_size(), 1);
        assert_eq!(config.read_version(), 1);
        for pin in DEFAULT_ADDRESS_PINS {
            assert_eq!(gpio.mode(pin), Some(PinMode::InputPullup));
        }
    }

    #[test]
    fn test_default_table_pattern_reads() {
        let mut gpio = MockGpio::default();
        jumpers(&gpio, 0b10100);
        let mut config = BoardConfig::new(ConfigMode::I2cExpander);

        assert_eq!(config.read_channel_from_address_pins(&mut gpio), Ok(24));
        assert_eq!(config.read_version(), 2);
        assert_eq!(config.io_size(), 3);
    }

    #[test]
    fn test_unrecognized_pattern_blocks_initialization() {
        let mut gpio = MockGpio::default();
        jumpers(&gpio, 0b00001);
        let mut config = BoardConfig::new(ConfigMode::I2cExpander)
            .with_version_table(&SIX_CHANNEL_BOARD)
            .unwrap();

        assert_eq!(
            config.read_channel_from_address_pins(&mut gpio),
            Err(ConfigError::UnrecognizedTopology { pattern: 0b00001 })
        );
        assert_eq!(config.channel_count(), 0);
        assert_eq!(
            config.initialize_pins(),
            Err(ConfigError::UnrecognizedTopology { pattern: 0b00001 })
        );
    }

    #[test]
    fn test_derive_io_size_keeps_threshold_policy() {
        assert_eq!(derive_io_size(0), 0);
        assert_eq!(derive_io_size(2), 1);
        assert_eq!(derive_io_size(6), 1);
        assert_eq!(derive_io_size(8), 1);
        assert_eq!(derive_io_size(10), 2);
        assert_eq!(derive_io_size(16), 2);
        assert_eq!(derive_io_size(24), 3);
        assert_eq!(derive_io_size(64), 8);
        // odd counts never pass the even check
        assert_eq!(derive_io_size(5), 0);
        assert_eq!(derive_io_size(17), 0);
    }

    #[test]
    fn test_version_by_channel_count() {
        let mut config = BoardConfig::new(ConfigMode::Custom)
            .with_version_table(&[])
            .unwrap();
        for (channels, version) in [(2, 1), (16, 1), (18, 2), (24, 2), (26, 3), (64, 3)] {
            config.set_channel(channels).unwrap();
            assert_eq!(config.read_version(), version, "{channels} channels");
        }
    }

    #[test]
    fn test_expander_mode_builds_logical_pins() {
        let mut config = BoardConfig::new(ConfigMode::I2cExpander);
        config.set_channel(6).unwrap();
        config.initialize_pins().unwrap();
        assert_eq!(config.pins(), &[0, 1, 2, 3, 4, 5]);
        assert_eq!(config.pins().len(), usize::from(config.channel_count()));
    }

    #[test]
    fn test_custom_sequence_permutes_pins() {
        let mut config = BoardConfig::new(ConfigMode::I2cExpander);
        config.set_channel(6).unwrap();
        config.apply_custom_sequence(&[3, 1, 2, 6, 5, 4]).unwrap();
        config.initialize_pins().unwrap();
        assert_eq!(config.pins(), &[2, 0, 1, 5, 4, 3]);

        let mut direct = direct_config(4);
        direct.apply_custom_sequence(&[4, 3, 2, 1]).unwrap();
        direct.initialize_pins().unwrap();
        assert_eq!(direct.pins(), &[13, 12, 11, 10]);
    }

    #[test]
    fn test_finalizing_twice_keeps_the_wiring_order() {
        let mut direct = direct_config(3);
        direct.apply_custom_sequence(&[2, 3, 1]).unwrap();
        direct.initialize_pins().unwrap();
        direct.initialize_pins().unwrap();
        assert_eq!(direct.pins(), &[11, 12, 10]);

        let mut expander = BoardConfig::new(ConfigMode::I2cExpander);
        expander.set_channel(4).unwrap();
        expander.apply_custom_sequence(&[4, 1, 2, 3]).unwrap();
        expander.initialize_pins().unwrap();
        expander.initialize_pins().unwrap();
        assert_eq!(expander.pins(), &[3, 0, 1, 2]);
    }

    #[test]
    fn test_custom_sequence_rejects_unknown_channels() {
        let mut config = BoardConfig::new(ConfigMode::I2cExpander);
        config.set_channel(4).unwrap();
        config.apply_custom_sequence(&[1, 2, 0, 3]).unwrap();
        assert_eq!(
            config.initialize_pins(),
            Err(ConfigError::InvalidSequence {
                position: 2,
                value: 0
            })
        );

        config.apply_custom_sequence(&[1, 2, 3, 9]).unwrap();
        assert_eq!(
            config.initialize_pins(),
            Err(ConfigError::InvalidSequence {
                position: 3,
                value: 9
            })
        );
    }

    #[test]
    fn test_direct_mode_requires_pin_per_channel() {
        let mut config = BoardConfig::new(ConfigMode::DirectIo);
        config.set_channel(4).unwrap();
        config.set_pins(&[1, 2, 3]).unwrap();
        assert_eq!(
            config.initialize_pins(),
            Err(ConfigError::PinCountMismatch {
                channels: 4,
                pins: 3
            })
        );
    }

    #[test]
    fn test_zero_channels_is_an_error() {
        let mut config = BoardConfig::new(ConfigMode::I2cExpander);
        assert_eq!(config.initialize_pins(), Err(ConfigError::ZeroChannels));
    }

    #[test]
    fn test_capacity_limits() {
        let mut config = BoardConfig::new(ConfigMode::I2cExpander);
        assert_eq!(
            config.set_channel(66),
            Err(ConfigError::AllocationFailure {
                requested: 66,
                capacity: 64
            })
        );
        assert_eq!(
            config.set_i2c_addresses(&[0x20; 9]),
            Err(ConfigError::AllocationFailure {
                requested: 9,
                capacity: 8
            })
        );
        assert!(config.set_pins(&[0; 65]).is_err());
    }

    #[test]
    fn test_default_i2c_addresses() {
        let config = BoardConfig::new(ConfigMode::I2cExpander);
        assert_eq!(
            config.i2c_addresses(),
            &[0x20, 0x24, 0x22, 0x23, 0x24, 0x25, 0x26, 0x27]
        );
    }

    #[test]
    fn test_configure_outputs_drives_pins_high() {
        let mut gpio = MockGpio::default();
        let mut config = direct_config(3);
        config.initialize_pins().unwrap();
        config.configure_outputs(&mut gpio);
        for pin in [10, 11, 12] {
            assert_eq!(gpio.mode(pin), Some(PinMode::Output));
            assert_eq!(gpio.level(pin), Some(PinState::High));
        }
    }
}
