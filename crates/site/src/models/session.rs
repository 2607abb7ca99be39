//! Session-related types.
//!
//! Keys under which authentication and visitor data live in the session.

/// Session keys.
pub mod keys {
    /// Email of the signed-in user. Its presence is what "logged in" means.
    pub const USER_EMAIL: &str = "user_email";

    /// Last known copy of the signed-in user's record.
    pub const USER_DATA: &str = "user_data";

    /// Unix seconds of the last time the backend confirmed the user.
    pub const VERIFIED_AT: &str = "verified_at";

    /// Reviews this visitor left during the session, keyed by shop id.
    pub const LOCAL_REVIEWS: &str = "local_reviews";
}
