//! Well-known local storage keys
//!
//! Every screen reads and writes its state under one of these names.

/// Boolean session flag
pub const IS_LOGGED_IN: &str = "isLoggedIn";
/// Sanitized JSON of the signed-in user
pub const CURRENT_USER: &str = "currentUser";
/// Users known to this device
pub const USERS: &str = "users";
/// Profile display name
pub const PROFILE_NAME: &str = "profile.name";
/// Profile email
pub const PROFILE_EMAIL: &str = "profile.email";
/// Profile phone
pub const PROFILE_PHONE: &str = "profile.phone";
/// Business profile
pub const UMKM_PROFILE: &str = "umkmProfile";
/// Ids of events the user registered for
pub const REGISTERED_EVENTS: &str = "registeredEvents";
/// Remaining slots per event
pub const EVENT_SLOTS: &str = "eventSlots";
/// Service access history
pub const ACCESSED_SERVICES: &str = "accessedServices";
/// Forum threads
pub const FORUM_THREADS: &str = "forumThreads";
/// Ids of threads the user liked
pub const LIKED_THREADS: &str = "likedThreads";
/// E-learning modules
pub const ELEARNING_MODULES: &str = "eLearningModules";
/// Ids of modules the user enrolled in
pub const MODULE_ENROLLMENTS: &str = "moduleEnrollments";
/// Kemenkop UKM programs
pub const KEMENKOP_PROGRAMS: &str = "kemenkopPrograms";
/// Ids of bookmarked programs
pub const PROGRAM_BOOKMARKS: &str = "programBookmarks";
/// Preferred UI language tag
pub const LANGUAGE: &str = "language";

/// Key holding the replies of one forum thread
pub fn thread_replies(thread_id: &str) -> String {
    format!("threadReplies_{thread_id}")
}

/// Key holding the submissions of one form type, e.g. `perizinanSubmissions`
pub fn submissions(form_key: &str) -> String {
    format!("{form_key}Submissions")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derived_keys() {
        assert_eq!(thread_replies("1700000000000"), "threadReplies_1700000000000");
        assert_eq!(submissions("perizinan"), "perizinanSubmissions");
        assert_eq!(submissions("profileUpdate"), "profileUpdateSubmissions");
    }
}
