pub mod booking;
pub mod referral;
