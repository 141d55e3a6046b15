//! Entity fixtures shared by the integration tests.
#![allow(dead_code)]

use chrono::{DateTime, Duration, Utc};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use worldsave::{
    GenericWriter, GuildEntity, ItemEntity, MapId, MobileEntity, Persistable, Result, SaveError,
    Serial,
};

pub const BRITANNIA: MapId = MapId(1);

// ============================================================================
// Mobiles
// ============================================================================

pub struct TestMobile {
    pub serial: Serial,
    pub kind: &'static str,
    pub name: String,
    pub hits: i32,
    pub fail_serialize: bool,
    pub cache_frees: Arc<AtomicUsize>,
}

impl TestMobile {
    pub fn new(serial: i32, kind: &'static str, name: &str) -> Self {
        Self {
            serial: Serial(serial),
            kind,
            name: name.to_string(),
            hits: 100,
            fail_serialize: false,
            cache_frees: Arc::new(AtomicUsize::new(0)),
        }
    }
}

impl Persistable for TestMobile {
    fn serial(&self) -> Serial {
        self.serial
    }

    fn serialize(&self, writer: &mut dyn GenericWriter) -> Result<()> {
        if self.fail_serialize {
            return Err(SaveError::Serialization(format!(
                "mobile {} refused to serialize",
                self.serial
            )));
        }
        writer.write_encoded_int(0)?;
        writer.write_string(Some(&self.name))?;
        writer.write_i32(self.hits)
    }

    fn free_cache(&self) {
        self.cache_frees.fetch_add(1, Ordering::SeqCst);
    }
}

impl MobileEntity for TestMobile {
    fn type_name(&self) -> &str {
        self.kind
    }
}

// ============================================================================
// Items
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecayVerdict {
    Remove,
    Keep,
    Fail,
}

pub struct TestItem {
    pub serial: Serial,
    pub kind: &'static str,
    pub decays: bool,
    pub parent: Option<Serial>,
    pub map: MapId,
    pub last_moved: DateTime<Utc>,
    pub decay_time: Duration,
    pub payload: Vec<u8>,
    pub verdict: DecayVerdict,
    pub decay_log: Arc<Mutex<Vec<Serial>>>,
}

impl TestItem {
    /// A ground item moved at `now` that will not decay for an hour.
    pub fn fresh(serial: i32, kind: &'static str, now: DateTime<Utc>) -> Self {
        Self {
            serial: Serial(serial),
            kind,
            decays: true,
            parent: None,
            map: BRITANNIA,
            last_moved: now,
            decay_time: Duration::hours(1),
            payload: vec![serial as u8; 3],
            verdict: DecayVerdict::Remove,
            decay_log: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// A ground item whose decay time ran out a minute before `now`.
    pub fn expired(serial: i32, kind: &'static str, now: DateTime<Utc>) -> Self {
        Self {
            last_moved: now - Duration::hours(1) - Duration::minutes(1),
            ..Self::fresh(serial, kind, now)
        }
    }

    pub fn verdict(mut self, verdict: DecayVerdict) -> Self {
        self.verdict = verdict;
        self
    }

    pub fn logging_to(mut self, log: &Arc<Mutex<Vec<Serial>>>) -> Self {
        self.decay_log = Arc::clone(log);
        self
    }
}

impl Persistable for TestItem {
    fn serial(&self) -> Serial {
        self.serial
    }

    fn serialize(&self, writer: &mut dyn GenericWriter) -> Result<()> {
        writer.write_encoded_int(1)?;
        writer.write_serial(self.parent.unwrap_or(Serial::ZERO))?;
        writer.write_u8(self.map.0)?;
        writer.write_datetime(self.last_moved)?;
        writer.write_encoded_int(self.payload.len() as i32)?;
        writer.write_bytes(&self.payload)
    }
}

impl ItemEntity for TestItem {
    fn type_name(&self) -> &str {
        self.kind
    }

    fn decays(&self) -> bool {
        self.decays
    }

    fn parent(&self) -> Option<Serial> {
        self.parent
    }

    fn map(&self) -> MapId {
        self.map
    }

    fn last_moved(&self) -> DateTime<Utc> {
        self.last_moved
    }

    fn decay_time(&self) -> Duration {
        self.decay_time
    }

    fn on_decay(&mut self) -> Result<bool> {
        self.decay_log.lock()?.push(self.serial);
        match self.verdict {
            DecayVerdict::Remove => Ok(true),
            DecayVerdict::Keep => Ok(false),
            DecayVerdict::Fail => Err(SaveError::Decay(format!(
                "item {} failed its decay hook",
                self.serial
            ))),
        }
    }
}

// ============================================================================
// Guilds
// ============================================================================

pub struct TestGuild {
    pub id: Serial,
    pub name: String,
    pub abbreviation: Option<String>,
    pub members: Vec<Serial>,
}

impl TestGuild {
    pub fn new(id: i32, name: &str, members: &[i32]) -> Self {
        Self {
            id: Serial(id),
            name: name.to_string(),
            abbreviation: None,
            members: members.iter().copied().map(Serial).collect(),
        }
    }
}

impl Persistable for TestGuild {
    fn serial(&self) -> Serial {
        self.id
    }

    fn serialize(&self, writer: &mut dyn GenericWriter) -> Result<()> {
        writer.write_encoded_int(0)?;
        writer.write_string(Some(&self.name))?;
        writer.write_string(self.abbreviation.as_deref())?;
        writer.write_encoded_int(self.members.len() as i32)?;
        for member in &self.members {
            writer.write_serial(*member)?;
        }
        Ok(())
    }
}

impl GuildEntity for TestGuild {}
