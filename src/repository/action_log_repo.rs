// ==========================================
// Si-Eligible - action log repository
// ==========================================
// Audit trail of every write operation (action_log table)
// ==========================================

mod core;
mod queries;


pub use core::ActionLogRepository;
