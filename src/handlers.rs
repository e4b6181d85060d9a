pub mod dashboard;
pub mod groups;
pub mod health;
pub mod memberships;
pub mod orphan_payments;
pub mod orphans;
pub mod payments;
pub mod sponsors;
pub mod statement;
