pub mod edit_ops;
