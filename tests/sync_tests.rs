//! Live sync tests against a loopback stand-in for the phone.

use std::collections::BTreeMap;
use std::io::{BufRead, BufReader, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use crossbeam_channel::{unbounded, Receiver};
use pretty_assertions::assert_eq;
use rand::rngs::StdRng;
use rand::SeedableRng;

use cassette::composition::{EffectDescriptor, Glyph, GlyphStore};
use cassette::sync::{
    scan_devices, Connection, ConnectionConfig, ConnectionState, DeviceBridge, Frame, GlyphSyncer,
};
use cassette::{PhoneModel, Result};

/// Loopback device: answers pings and forwards every other frame.
struct FakeDevice {
    addr: String,
    frames: Receiver<Frame>,
}

impl FakeDevice {
    fn start(connections: usize) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        let (tx, frames) = unbounded();

        thread::spawn(move || {
            for stream in listener.incoming().take(connections) {
                let stream: TcpStream = stream.unwrap();
                let tx = tx.clone();
                thread::spawn(move || {
                    let mut writer = stream.try_clone().unwrap();
                    let reader = BufReader::new(stream);
                    for line in reader.lines() {
                        let Ok(line) = line else { break };
                        let frame = Frame::from_line(&line).unwrap();
                        if frame == Frame::Ping {
                            writer.write_all(b"pong\n").unwrap();
                        } else if tx.send(frame).is_err() {
                            break;
                        }
                    }
                });
            }
        });

        Self { addr, frames }
    }

    fn next(&self) -> Frame {
        self.frames.recv_timeout(Duration::from_secs(5)).unwrap()
    }
}

fn connection(addr: &str) -> Arc<Connection> {
    Arc::new(
        Connection::spawn(ConnectionConfig {
            addr: addr.to_string(),
            handshake_attempts: 3,
            handshake_delay: Duration::from_millis(20),
            connect_timeout: Duration::from_millis(500),
            pong_timeout: Duration::from_millis(500),
        })
        .unwrap(),
    )
}

fn syncer(connection: Arc<Connection>) -> GlyphSyncer {
    GlyphSyncer::new(connection, PhoneModel::Phone2A, 120.0, StdRng::seed_from_u64(3))
}

#[test]
fn test_store_mutations_reach_device() {
    let device = FakeDevice::start(1);
    let connection = connection(&device.addr);
    connection.handshake().unwrap();
    assert_eq!(connection.state(), ConnectionState::Connected);

    let syncer = syncer(connection.clone());
    let mut store = GlyphStore::new(BTreeMap::new()).with_sink(Box::new(syncer.clone()));

    let id = store.insert(Glyph::new("2", 0.0, 500.0, 100)).unwrap();
    match device.next() {
        Frame::Update { glyphs } => {
            assert_eq!(glyphs.len(), 1);
            assert_eq!(glyphs[&id].glyph.track, "2");
            assert!(glyphs[&id].effect_to_glyphs.is_none());
        }
        other => panic!("expected update, got {:?}", other),
    }

    let fill = EffectDescriptor::new("Fill").with_setting("segmented", true);
    let mut glyph = Glyph::new("1", 0.0, 1000.0, 100);
    glyph.effect = Some(fill);
    let effect_id = store.insert(glyph).unwrap();
    match device.next() {
        Frame::Update { glyphs } => {
            assert_eq!(glyphs.keys().collect::<Vec<_>>(), vec![&effect_id]);
            let segments = glyphs[&effect_id].effect_to_glyphs.as_ref().unwrap();
            assert_eq!(segments.len(), 24);
        }
        other => panic!("expected update, got {:?}", other),
    }

    assert!(store.delete(&id));
    assert_eq!(device.next(), Frame::Delete { ids: vec![id] });

    syncer.play(1200);
    assert_eq!(device.next(), Frame::Play { from_ms: 1200 });
    syncer.stop();
    assert_eq!(device.next(), Frame::Stop);
}

#[test]
fn test_full_load_sends_ids() {
    let device = FakeDevice::start(1);
    let connection = connection(&device.addr);
    connection.handshake().unwrap();

    let mut glyphs = BTreeMap::new();
    glyphs.insert("3".to_string(), Glyph::new("3", 10.0, 20.0, 50));
    glyphs.insert("5".to_string(), Glyph::new("1", 0.0, 20.0, 50));

    let syncer = syncer(connection);
    syncer.full_load(&glyphs);
    match device.next() {
        Frame::Load { glyphs: sent } => {
            let ids: Vec<Option<String>> = sent.iter().map(|g| g.id.clone()).collect();
            assert_eq!(ids, vec![Some("3".to_string()), Some("5".to_string())]);
        }
        other => panic!("expected load, got {:?}", other),
    }
    assert_eq!(syncer.snapshot(), glyphs);
}

#[test]
fn test_frames_while_disconnected_are_dropped() {
    let device = FakeDevice::start(2);
    let connection = connection(&device.addr);
    connection.handshake().unwrap();
    let syncer = syncer(connection.clone());

    syncer.play(0);
    assert_eq!(device.next(), Frame::Play { from_ms: 0 });

    // Frames sent while disconnected are lost; a new handshake resumes.
    connection.disconnect();
    connection.flush();
    assert_eq!(connection.state(), ConnectionState::Disconnected);
    syncer.stop();
    connection.flush();
    assert!(device.frames.recv_timeout(Duration::from_millis(200)).is_err());

    connection.handshake().unwrap();
    syncer.play(500);
    assert_eq!(device.next(), Frame::Play { from_ms: 500 });
}

/// Bridge reporting one supported phone, recording prepare calls.
struct OnePhone {
    prepared: Mutex<Vec<(String, u16)>>,
}

impl DeviceBridge for OnePhone {
    fn devices(&self) -> Result<Vec<String>> {
        Ok(vec!["SERIAL1".to_string()])
    }

    fn product_model(&self, _device: &str) -> Result<Option<PhoneModel>> {
        Ok(Some(PhoneModel::Phone2A))
    }

    fn prepare(&self, device: &str, port: u16) -> Result<()> {
        self.prepared.lock().unwrap().push((device.to_string(), port));
        Ok(())
    }
}

#[test]
fn test_scan_connects_new_device_and_loads_snapshot() {
    let device = FakeDevice::start(1);
    let connection = connection(&device.addr);
    let syncer = syncer(connection.clone());

    let mut glyphs = BTreeMap::new();
    glyphs.insert("1".to_string(), Glyph::new("3", 0.0, 100.0, 100));
    syncer.sync(&glyphs);

    let bridge = OnePhone {
        prepared: Mutex::new(Vec::new()),
    };
    let mut known = Vec::new();
    let found = scan_devices(&bridge, &syncer, &mut known, 7777).unwrap();
    assert_eq!(found, Some(("SERIAL1".to_string(), PhoneModel::Phone2A)));
    assert_eq!(*bridge.prepared.lock().unwrap(), vec![("SERIAL1".to_string(), 7777)]);
    assert!(connection.is_connected());

    match device.next() {
        Frame::Load { glyphs: sent } => assert_eq!(sent.len(), 1),
        other => panic!("expected load, got {:?}", other),
    }

    // Same device list: nothing to do.
    assert_eq!(scan_devices(&bridge, &syncer, &mut known, 7777).unwrap(), None);
}
