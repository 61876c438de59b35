use secrecy::SecretString;

#[derive(Debug, Clone)]
pub struct GlobalArgs {
    /// Process-wide signing secret. Rotating it invalidates every
    /// outstanding token and stored session pointer at once.
    pub jwt_secret: SecretString,
}

impl GlobalArgs {
    #[must_use]
    pub fn new(jwt_secret: SecretString) -> Self {
        Self { jwt_secret }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    #[test]
    fn test_global_args() {
        let args = GlobalArgs::new(SecretString::from("s3cret".to_string()));
        assert_eq!(args.jwt_secret.expose_secret(), "s3cret");
    }
}
