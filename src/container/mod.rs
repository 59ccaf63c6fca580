pub mod extendible_hash_table;
pub mod hash_function;
pub mod hash_table;
