pub mod cash_flows;
pub mod costs;
pub mod exit;
pub mod inputs;
pub mod pro_forma;
pub mod projection;
pub mod report;
