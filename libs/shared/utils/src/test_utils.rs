use std::sync::Arc;

use serde_json::{json, Value};

use shared_config::AppConfig;

/// Configuration pointing at a mock store (wiremock) for integration tests.
pub struct TestConfig {
    pub store_url: String,
    pub store_api_key: String,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            store_url: "http://localhost:54321".to_string(),
            store_api_key: "test-api-key".to_string(),
        }
    }
}

impl TestConfig {
    pub fn with_store_url(store_url: &str) -> Self {
        Self {
            store_url: store_url.to_string(),
            ..Self::default()
        }
    }

    pub fn to_app_config(&self) -> AppConfig {
        AppConfig {
            store_url: self.store_url.clone(),
            store_api_key: self.store_api_key.clone(),
            port: 0,
        }
    }

    pub fn to_arc(&self) -> Arc<AppConfig> {
        Arc::new(self.to_app_config())
    }
}

/// Canned store rows matching the clinic schema, for wiremock responses.
pub struct MockStoreRows;

impl MockStoreRows {
    pub fn patient(patient_id: i64, first_name: &str, last_name: &str) -> Value {
        json!({
            "patient_id": patient_id,
            "first_name": first_name,
            "last_name": last_name,
            "birth_date": "1990-04-02",
            "phone": "0812345678"
        })
    }

    pub fn doctor(doctor_id: i64, first_name: &str, last_name: &str) -> Value {
        json!({
            "doctor_id": doctor_id,
            "first_name": first_name,
            "last_name": last_name,
            "username": "doc",
            "password": "secret"
        })
    }

    pub fn appointment(
        appointment_id: i64,
        patient_id: i64,
        doctor_id: i64,
        date: &str,
        time: &str,
        status: &str,
    ) -> Value {
        json!({
            "appointment_id": appointment_id,
            "patient_id": patient_id,
            "doctor_id": doctor_id,
            "appointment_date": date,
            "appointment_time": time,
            "status": status
        })
    }

    pub fn treatment(treatment_id: i64, appointment_id: i64, patient_id: i64, doctor_id: i64) -> Value {
        json!({
            "treatment_id": treatment_id,
            "patient_id": patient_id,
            "doctor_id": doctor_id,
            "appointment_id": appointment_id,
            "symptom": "ไอ เจ็บคอ",
            "diagnosis": "หวัด",
            "advice": "พักผ่อนมาก ๆ",
            "treatment_date": "2025-11-13"
        })
    }

    pub fn payment(payment_id: i64, appointment_id: i64, patient_id: i64, status: &str) -> Value {
        json!({
            "payment_id": payment_id,
            "patient_id": patient_id,
            "appointment_id": appointment_id,
            "amount": 0.0,
            "payment_method": "cash",
            "payment_date": null,
            "status": status
        })
    }

    pub fn employee(employee_id: i64, username: &str, position: &str) -> Value {
        json!({
            "employee_id": employee_id,
            "first_name": "สมศรี",
            "last_name": "ใจดี",
            "username": username,
            "password": "secret",
            "position": position
        })
    }
}
