//! Service layer for the relay's business logic.
//!
//! Services hold a handle to the shared store and to the external senders;
//! they are constructed once at startup and cloned into handlers and job
//! tasks (cloning is cheap, everything is Arc-backed).

mod filter_service;
mod sms_service;

pub use filter_service::{
    FilterRule, FilterService, Verdict, apply_exclude, apply_include, collect_contents,
    suppressed_envelope,
};
pub use sms_service::{Recipients, SmsContent, SmsMessage, SmsService};

use crate::config::Settings;
use crate::external::{FeishuClient, MasClient};
use crate::store::Store;

/// Aggregates all services for convenient access.
#[derive(Clone)]
pub struct Services {
    pub sms: SmsService,
    pub filter: FilterService,
}

impl Services {
    /// Creates a new Services instance from a store handle and settings.
    pub fn new(store: Store, settings: &Settings) -> Self {
        let feishu = FeishuClient::new(settings.feishu.clone());
        let mas = MasClient::new(settings.mas.clone());
        Self {
            sms: SmsService::new(store.clone(), mas, settings.sms.clone()),
            filter: FilterService::new(store, feishu, settings.feishu.clone()),
        }
    }
}
