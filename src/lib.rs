pub mod error;

pub mod memory;
pub mod value;

pub mod native_type;
pub mod primitives;

pub mod field;
pub mod layout;

pub mod descriptor;
pub mod marshal;

pub mod instance;
pub mod registry;
pub mod report;
