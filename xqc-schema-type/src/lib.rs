mod profile;
mod xs;

pub use profile::TypeProfile;
pub use xs::Xs;
