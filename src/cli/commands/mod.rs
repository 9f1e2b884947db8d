mod cleanup;
pub mod context;
mod delete_group;
mod init;
mod list;
mod run;

pub use cleanup::execute_cleanup;
pub use delete_group::execute_delete_group;
pub use init::execute_init;
pub use list::execute_list;
pub use run::execute_run;
