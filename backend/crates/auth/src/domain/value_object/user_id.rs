pub use kernel::id::{UserId, markers::User as UserMarker};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_id_from_db() {
        let user_id = UserId::new(7);
        assert_eq!(user_id.get(), 7);
        assert_eq!(user_id.to_string(), "7");
    }
}
