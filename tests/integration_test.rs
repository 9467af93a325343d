//! Integration tests for the full command/response flow.

use anyhow::{anyhow, Result};
use parking_lot::Mutex;
use std::sync::Arc;
use tempfile::TempDir;

use soundcore_device_faker::bluetooth::protocol::checksum;
use soundcore_device_faker::bluetooth::{
    decode_command, CommandCode, Connection, PacketHandler, VendorSession,
};
use soundcore_device_faker::config::DeviceConfig;
use soundcore_device_faker::state::DeviceState;

/// In-memory stand-in for an RFCOMM link.
#[derive(Default)]
struct FakeLink {
    written: Mutex<Vec<Vec<u8>>>,
    handler: Mutex<Option<PacketHandler>>,
}

impl FakeLink {
    fn deliver(&self, data: &[u8]) -> Result<()> {
        let guard = self.handler.lock();
        let handler = guard.as_ref().ok_or_else(|| anyhow!("no handler bound"))?;
        handler(data)
    }

    fn take_written(&self) -> Vec<Vec<u8>> {
        std::mem::take(&mut *self.written.lock())
    }
}

impl Connection for FakeLink {
    fn write(&self, data: &[u8]) -> Result<()> {
        self.written.lock().push(data.to_vec());
        Ok(())
    }

    fn set_packet_handler(&self, handler: PacketHandler) {
        *self.handler.lock() = Some(handler);
    }
}

const DEVICE: &str = r#"
name = "Soundcore Faker"
rfcomm_uuid = "0cf12d31-fac3-4553-bd80-d6832e7b3952"

[[responses]]
command = [1, 2]
response = [0x11, 0x22]
"#;

/// A client request for command 01 02.
const REQUEST: [u8; 10] = [0x08, 0xEE, 0x00, 0x00, 0x00, 0x01, 0x02, 0x0A, 0x00, 0x03];

fn connect(state: &DeviceState) -> Arc<FakeLink> {
    let link = Arc::new(FakeLink::default());
    let (responses, has_checksum) = state.start_session();
    VendorSession::new(Arc::clone(&link), responses, has_checksum).bind();
    link
}

#[test]
fn test_configured_response() -> Result<()> {
    let state = DeviceState::new(DeviceConfig::from_toml_str(DEVICE)?);
    let link = connect(&state);

    link.deliver(&REQUEST)?;

    let written = link.take_written();
    assert_eq!(written.len(), 1);
    let frame = &written[0];
    assert_eq!(
        &frame[..11],
        &[0x09, 0xFF, 0x00, 0x00, 0x01, 0x01, 0x02, 0x0C, 0x00, 0x11, 0x22]
    );
    assert_eq!(frame[11], checksum(&frame[..11]));

    Ok(())
}

#[test]
fn test_unknown_command_acknowledged() -> Result<()> {
    let state = DeviceState::new(DeviceConfig::from_toml_str(
        r#"
name = "Soundcore Faker"
rfcomm_uuid = "0cf12d31-fac3-4553-bd80-d6832e7b3952"
"#,
    )?);
    let link = connect(&state);

    link.deliver(&REQUEST)?;

    let written = link.take_written();
    assert_eq!(written.len(), 1);
    let frame = &written[0];
    assert_eq!(
        &frame[..9],
        &[0x09, 0xFF, 0x00, 0x00, 0x01, 0x01, 0x02, 0x0A, 0x00]
    );
    assert_eq!(frame.len(), 10);
    assert_eq!(frame[9], checksum(&frame[..9]));
    assert_eq!(decode_command(frame)?, CommandCode::new([0x01, 0x02]));

    Ok(())
}

#[test]
fn test_reload_duplicate_command_last_wins() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let path = temp_dir.path().join("device.toml");
    std::fs::write(&path, DEVICE)?;

    let state = DeviceState::new(DeviceConfig::load(&path)?);
    let link = connect(&state);

    std::fs::write(
        &path,
        r#"
name = "Soundcore Faker"
rfcomm_uuid = "0cf12d31-fac3-4553-bd80-d6832e7b3952"

[[responses]]
command = [1, 2]
response = [0xAA]

[[responses]]
command = [1, 2]
response = [0xBB]
"#,
    )?;
    state.reload_from(&path)?;

    link.deliver(&REQUEST)?;
    let written = link.take_written();
    let frame = &written[0];
    assert_eq!(&frame[7..10], &[0x0B, 0x00, 0xBB]);

    Ok(())
}

#[test]
fn test_broken_reload_keeps_serving_last_good() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let path = temp_dir.path().join("device.toml");
    std::fs::write(&path, DEVICE)?;

    let state = DeviceState::new(DeviceConfig::load(&path)?);
    let link = connect(&state);

    std::fs::write(&path, "name = \"half written")?;
    assert!(state.reload_from(&path).is_err());

    link.deliver(&REQUEST)?;
    let written = link.take_written();
    assert_eq!(&written[0][9..11], &[0x11, 0x22]);

    // New sessions also use the last good config.
    let second = connect(&state);
    second.deliver(&REQUEST)?;
    assert_eq!(&second.take_written()[0][9..11], &[0x11, 0x22]);

    Ok(())
}

#[test]
fn test_oversized_reload_keeps_serving_last_good() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let path = temp_dir.path().join("device.toml");
    std::fs::write(&path, DEVICE)?;

    let state = DeviceState::new(DeviceConfig::load(&path)?);
    let link = connect(&state);

    let oversized = vec!["0"; 70_000].join(", ");
    std::fs::write(
        &path,
        format!(
            "name = \"Soundcore Faker\"\n\
             rfcomm_uuid = \"0cf12d31-fac3-4553-bd80-d6832e7b3952\"\n\
             [[responses]]\n\
             command = [1, 2]\n\
             response = [{}]\n",
            oversized
        ),
    )?;
    assert!(state.reload_from(&path).is_err());

    link.deliver(&REQUEST)?;
    let written = link.take_written();
    assert_eq!(&written[0][7..11], &[0x0C, 0x00, 0x11, 0x22]);

    Ok(())
}

#[test]
fn test_checksum_setting_applies_to_new_sessions_only() -> Result<()> {
    let state = DeviceState::new(DeviceConfig::from_toml_str(DEVICE)?);
    let first = connect(&state);

    let mut config = DeviceConfig::from_toml_str(DEVICE)?;
    config.has_checksum = false;
    state.apply_config(config);
    let second = connect(&state);

    first.deliver(&REQUEST)?;
    second.deliver(&REQUEST)?;

    assert_eq!(first.take_written()[0].len(), 12);
    assert_eq!(second.take_written()[0].len(), 11);

    Ok(())
}

#[test]
fn test_every_packet_gets_one_reply() -> Result<()> {
    let state = DeviceState::new(DeviceConfig::from_toml_str(DEVICE)?);
    let link = connect(&state);

    let mut other = REQUEST;
    other[6] = 0x03;
    for packet in [&REQUEST[..], &other[..], &REQUEST[..]] {
        link.deliver(packet)?;
    }

    let written = link.take_written();
    assert_eq!(written.len(), 3);
    assert_eq!(written[0], written[2]);
    assert_eq!(written[1].len(), 10);

    Ok(())
}
