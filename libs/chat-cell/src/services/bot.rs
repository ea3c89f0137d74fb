// libs/chat-cell/src/services/bot.rs
//
// The bot behind the chat box. Free text goes through the intent table and
// entity extraction, then dispatches to the slot calculator or the patient
// summary. Replies are Thai sentences; a message the bot cannot act on gets
// a guidance reply, not an error.

use chrono::{Local, NaiveDate};
use reqwest::Method;
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

use appointment_cell::services::conflict::ConflictDetectionService;
use appointment_cell::services::slots::SlotService;
use patient_cell::models::{PatientError, PatientSummary};
use patient_cell::services::directory::PatientDirectoryService;
use shared_config::AppConfig;
use shared_database::postgrest::StoreClient;
use shared_models::time::parse_hhmm;

use crate::intent::{detect_intent, extract_entities, Intent};
use crate::models::{ChatError, ChatReply, ValidateAppointmentRequest};

/// How many free slots a chat reply quotes before trailing off.
const REPLY_SLOT_LIMIT: usize = 5;

pub struct BotService {
    store: Arc<StoreClient>,
    slots: SlotService,
    conflicts: ConflictDetectionService,
    directory: PatientDirectoryService,
}

impl BotService {
    pub fn new(config: &AppConfig) -> Self {
        let store = Arc::new(StoreClient::new(config));
        Self {
            slots: SlotService::new(Arc::clone(&store)),
            conflicts: ConflictDetectionService::new(Arc::clone(&store)),
            directory: PatientDirectoryService::new(config),
            store,
        }
    }

    /// Route one chat message. The caller has already rejected empty input.
    pub async fn chat(&self, message: &str) -> Result<ChatReply, ChatError> {
        let today = Local::now().date_naive();
        let intent = detect_intent(message);
        let entities = extract_entities(message, today);
        debug!("Chat message routed: intent={:?} entities={:?}", intent, entities);

        let Some(intent) = intent else {
            return Ok(ChatReply::guidance(
                "ตอนนี้ผมยังไม่เข้าใจคำสั่งนี้ ลองใช้คำว่า เช็กนัด / เวลาว่างหมอ / ประวัติคนไข้ ดูนะครับ",
            ));
        };

        match intent {
            Intent::SuggestSlots => {
                let (Some(doctor_id), Some(date)) = (entities.doctor_id, entities.date) else {
                    return Ok(ChatReply::guidance(
                        "ขอเลขหมอและวันที่ด้วยครับ เช่น 'ดูเวลาว่างหมอ 1 วันที่ 15'",
                    ));
                };
                self.reply_with_slots(doctor_id, date).await
            }
            Intent::PatientSummary => {
                let Some(patient_id) = entities.patient_id else {
                    return Ok(ChatReply::guidance(
                        "ขอรหัสคนไข้ด้วยครับ เช่น 'ดูประวัติคนไข้ 5'",
                    ));
                };
                self.reply_with_summary(patient_id).await
            }
            Intent::CheckAppointment => Ok(ChatReply::understood(
                "ตอนนี้ยังไม่รองรับการเช็กนัดแบบประโยคอิสระเต็ม ๆ นะครับ แนะนำใช้ฟอร์มหน้าจัดการนัดหมาย แล้วกดให้บอทตรวจสอบแทนครับ",
            )),
        }
    }

    async fn reply_with_slots(
        &self,
        doctor_id: i64,
        date: NaiveDate,
    ) -> Result<ChatReply, ChatError> {
        let slots = self.free_slots(doctor_id, date).await?;
        let quoted: Vec<String> = slots.into_iter().take(REPLY_SLOT_LIMIT).collect();

        let reply = if quoted.is_empty() {
            format!("วันที่ {} หมอ {} คิวเต็มแล้วครับ", date, doctor_id)
        } else {
            format!(
                "วันที่ {} หมอ {} มีเวลาว่างเช่น {} ครับ",
                date,
                doctor_id,
                quoted.join(", ")
            )
        };
        Ok(ChatReply::understood(reply))
    }

    async fn reply_with_summary(&self, patient_id: i64) -> Result<ChatReply, ChatError> {
        let summary = match self.patient_summary(patient_id).await {
            Ok(summary) => summary,
            Err(ChatError::ValidationError(_)) => {
                return Ok(ChatReply::guidance("ไม่พบข้อมูลผู้ป่วยครับ"));
            }
            Err(e) => return Err(e),
        };

        let reply = match summary.recent_treatments.first() {
            None => format!(
                "คนไข้รหัส {} ยังไม่มีประวัติการรักษาในระบบครับ",
                patient_id
            ),
            Some(last) => format!(
                "คนไข้รหัส {} มารักษาล่าสุดวันที่ {} วินิจฉัยว่า {} คำแนะนำ: {}",
                patient_id, last.treatment_date, last.diagnosis, last.advice
            ),
        };
        Ok(ChatReply::understood(reply))
    }

    /// Free slots for the structured /suggest_slots endpoint and the chat path.
    pub async fn free_slots(
        &self,
        doctor_id: i64,
        date: NaiveDate,
    ) -> Result<Vec<String>, ChatError> {
        self.slots
            .suggest_slots(doctor_id, date)
            .await
            .map_err(|e| ChatError::DatabaseError(e.to_string()))
    }

    /// Patient summary for the structured endpoint. A missing patient comes
    /// back as a ValidationError so callers can phrase their own reply.
    pub async fn patient_summary(&self, patient_id: i64) -> Result<PatientSummary, ChatError> {
        self.directory.summary(patient_id).await.map_err(|e| match e {
            PatientError::NotFound => ChatError::ValidationError("ไม่พบข้อมูลผู้ป่วย".to_string()),
            PatientError::DatabaseError(msg) => ChatError::DatabaseError(msg),
        })
    }

    /// Pre-save check for the booking form. Accumulates every problem it
    /// finds; an empty list means the appointment can be saved.
    pub async fn validate_appointment(
        &self,
        request: &ValidateAppointmentRequest,
    ) -> Result<Vec<String>, ChatError> {
        let mut errors = Vec::new();

        if request.patient_id.is_none() {
            errors.push("กรุณาระบุรหัสผู้ป่วย".to_string());
        }
        if request.doctor_id.is_none() {
            errors.push("กรุณาเลือกแพทย์".to_string());
        }
        let date = request
            .appointment_date
            .as_deref()
            .and_then(|raw| NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok());
        let time = request
            .appointment_time
            .as_deref()
            .and_then(|raw| parse_hhmm(raw).ok());
        if date.is_none() || time.is_none() {
            errors.push("กรุณาเลือกวันและเวลานัดหมาย".to_string());
        }
        if !errors.is_empty() {
            return Ok(errors);
        }

        let patient_id = request.patient_id.unwrap_or_default();
        let doctor_id = request.doctor_id.unwrap_or_default();

        if !self.row_exists("patient", "patient_id", patient_id).await? {
            errors.push("ไม่พบข้อมูลผู้ป่วยในระบบ".to_string());
        }
        if !self.row_exists("doctor", "doctor_id", doctor_id).await? {
            errors.push("ไม่พบข้อมูลแพทย์ในระบบ".to_string());
        }

        if errors.is_empty() {
            let clash = self
                .conflicts
                .has_conflict(
                    doctor_id,
                    date.unwrap_or_default(),
                    time.unwrap_or_default(),
                    None,
                )
                .await
                .map_err(|e| ChatError::DatabaseError(e.to_string()))?;
            if clash {
                errors.push(
                    "ช่วงเวลาดังกล่าวมีนัดของแพทย์ท่านนี้อยู่แล้ว กรุณาเลือกเวลาอื่นที่ห่างอย่างน้อย 15 นาที"
                        .to_string(),
                );
            }
        }

        Ok(errors)
    }

    async fn row_exists(&self, table: &str, id_column: &str, id: i64) -> Result<bool, ChatError> {
        let path = format!(
            "/rest/v1/{}?{}=eq.{}&select={}",
            table, id_column, id, id_column
        );
        let rows: Vec<Value> = self
            .store
            .request(Method::GET, &path, None)
            .await
            .map_err(|e| ChatError::DatabaseError(e.to_string()))?;
        Ok(!rows.is_empty())
    }
}
