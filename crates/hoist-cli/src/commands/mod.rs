mod build;
mod deploy;
mod doctor;
mod pipeline;
mod push;
mod release;
mod status;

pub use build::build;
pub use deploy::deploy;
pub use doctor::doctor;
pub use push::push;
pub use release::release;
pub use status::status;
