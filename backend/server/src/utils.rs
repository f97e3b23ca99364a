use serde_json::Value;
use subtle::ConstantTimeEq;

use crate::{
    error::AppError::{self, InvalidCredentials, InvalidStock},
    models::{AdminAccount, LoginPayload},
};

/// Ref stock must be a JSON number and not negative.
pub fn validate_stock(stock: &Value) -> Result<(), AppError> {
    match stock.as_f64() {
        Some(value) if value >= 0.0 => Ok(()),
        _ => Err(InvalidStock),
    }
}

pub fn passwords_match(submitted: &str, stored: &str) -> bool {
    submitted.as_bytes().ct_eq(stored.as_bytes()).into()
}

pub fn check_login(payload: &LoginPayload, admin: Option<&AdminAccount>) -> Result<(), AppError> {
    let (Some(admin), Some(pass)) = (admin, payload.pass.as_deref()) else {
        return Err(InvalidCredentials);
    };

    if !passwords_match(pass, &admin.pass) {
        return Err(InvalidCredentials);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn admin() -> AdminAccount {
        AdminAccount {
            email: "admin@garage.fr".to_string(),
            pass: "hunter2".to_string(),
        }
    }

    fn login(pass: Option<&str>) -> LoginPayload {
        LoginPayload {
            email: Some("admin@garage.fr".to_string()),
            pass: pass.map(str::to_string),
        }
    }

    #[test]
    fn test_valid_stock() {
        assert!(validate_stock(&json!(0)).is_ok());
        assert!(validate_stock(&json!(12)).is_ok());
        assert!(validate_stock(&json!(2.5)).is_ok());
    }

    #[test]
    fn test_invalid_stock() {
        assert!(matches!(validate_stock(&json!(-1)), Err(InvalidStock)));
        assert!(matches!(validate_stock(&json!(-0.5)), Err(InvalidStock)));
        assert!(matches!(validate_stock(&json!("10")), Err(InvalidStock)));
        assert!(matches!(validate_stock(&Value::Null), Err(InvalidStock)));
        assert!(matches!(validate_stock(&json!([1])), Err(InvalidStock)));
    }

    #[test]
    fn test_passwords_match() {
        assert!(passwords_match("hunter2", "hunter2"));
        assert!(!passwords_match("hunter", "hunter2"));
        assert!(!passwords_match("Hunter2", "hunter2"));
        assert!(!passwords_match("", "hunter2"));
    }

    #[test]
    fn test_check_login() {
        let admin = admin();

        assert!(check_login(&login(Some("hunter2")), Some(&admin)).is_ok());
        assert!(matches!(
            check_login(&login(Some("wrong")), Some(&admin)),
            Err(InvalidCredentials)
        ));
        assert!(matches!(check_login(&login(None), Some(&admin)), Err(InvalidCredentials)));
        assert!(matches!(check_login(&login(Some("hunter2")), None), Err(InvalidCredentials)));
    }
}
