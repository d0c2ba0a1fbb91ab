pub mod add;
pub mod agenda;
pub mod cancel;
pub mod delete;
pub mod r#do;
pub mod edit;
pub mod list;
pub mod project;
pub mod recur;
pub mod trash;
