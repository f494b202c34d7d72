pub(crate) mod generate;
pub(crate) mod helpers;
pub(crate) mod inspect;
pub(crate) mod verify;
pub(crate) mod verify_batch;
