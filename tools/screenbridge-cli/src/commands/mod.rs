pub mod bridge;
pub mod check;
pub mod displays;
pub mod permission;
pub mod record;
pub mod windows;
