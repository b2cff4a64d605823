pub mod root_admin;
pub mod serve;
pub mod tabs;
