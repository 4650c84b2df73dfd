//! Gateway orchestration
//!
//! The request state machine plus the collaborators it consumes and the bounded
//! queue that carries audit and usage work off the request path.

pub mod background;
pub mod collaborators;
pub mod orchestrator;

pub use background::{BackgroundConfig, BackgroundJob, BackgroundQueue};
pub use collaborators::{
    AuditEvent, AuditSink, QuotaService, QuotaStatus, RedisAuditSink, RedisQuotaService,
    RedisUsageSink, RequestStats, UsageSink,
};
pub use orchestrator::{
    CallerContext, Gateway, GatewayDeps, GatewayResponse, ModelEntry, ModelList, REDACTION_NOTICE,
};
