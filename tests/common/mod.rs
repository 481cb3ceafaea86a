#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{TimeZone, Utc};
use futures_util::future::BoxFuture;
use parking_lot::Mutex;

use rollcall::directory::{Activity, DirectoryClient, Member};
use rollcall::error::FetchError;

/// In-memory directory with call counters and switchable failure modes.
#[derive(Default)]
pub struct FakeDirectory {
    pub members: Mutex<Vec<Member>>,
    pub activity: Mutex<Vec<Activity>>,
    pub roster_calls: AtomicUsize,
    pub activity_calls: AtomicUsize,
    pub presence: Mutex<Vec<String>>,
    pub fail_with: Mutex<Option<FetchError>>,
    pub hang: AtomicBool,
    pub delay_ms: AtomicU64,
}

impl FakeDirectory {
    pub fn with_members(members: Vec<Member>) -> Arc<Self> {
        let d = Self::default();
        *d.members.lock() = members;
        Arc::new(d)
    }

    pub fn roster_calls(&self) -> usize { self.roster_calls.load(Ordering::SeqCst) }

    pub fn fail(&self, e: FetchError) { *self.fail_with.lock() = Some(e); }

    pub fn recover(&self) { *self.fail_with.lock() = None; }

    async fn pause(&self) {
        if self.hang.load(Ordering::SeqCst) {
            tokio::time::sleep(Duration::from_secs(3600)).await;
        }
        let ms = self.delay_ms.load(Ordering::SeqCst);
        if ms > 0 {
            tokio::time::sleep(Duration::from_millis(ms)).await;
        }
    }
}

impl DirectoryClient for FakeDirectory {
    fn fetch_roster(&self) -> BoxFuture<'_, Result<Vec<Member>, FetchError>> {
        Box::pin(async move {
            self.roster_calls.fetch_add(1, Ordering::SeqCst);
            self.pause().await;
            if let Some(e) = self.fail_with.lock().clone() {
                return Err(e);
            }
            Ok(self.members.lock().clone())
        })
    }

    fn fetch_recent_activity(&self) -> BoxFuture<'_, Result<Vec<Activity>, FetchError>> {
        Box::pin(async move {
            self.activity_calls.fetch_add(1, Ordering::SeqCst);
            if let Some(e) = self.fail_with.lock().clone() {
                return Err(e);
            }
            Ok(self.activity.lock().clone())
        })
    }

    fn record_presence<'a>(&'a self, name: &'a str) -> BoxFuture<'a, Result<(), FetchError>> {
        Box::pin(async move {
            if let Some(e) = self.fail_with.lock().clone() {
                return Err(e);
            }
            self.presence.lock().push(name.to_string());
            let mut activity = self.activity.lock();
            activity.retain(|a| a.name != name);
            activity.push(Activity { name: name.to_string(), last_seen: Utc.with_ymd_and_hms(2026, 10, 18, 19, 30, 0).unwrap() });
            Ok(())
        })
    }
}

/// Small congregation roster: one role-based leader, one group-based leader, plain members.
pub fn sample_roster() -> Vec<Member> {
    vec![
        Member::new("Carlos Souza", "123").with_role("Membro").with_group("G1").with_leader("G1 | Maria S"),
        Member::new("Maria Silva", "456").with_role("Membro").with_group("G1"),
        Member::new("Pedro Álvares", "789").with_role("Líder de Grupo").with_group("G2"),
        Member::new("Joana Prado", "321").with_role("Membro").with_group("G2").with_leader("G2 | Pedro Alvares"),
    ]
}
