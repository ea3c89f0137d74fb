// libs/chat-cell/src/intent.rs
//
// Thai keyword routing for the chat bot. Matching is an ordered first-match
// scan over literal phrases; the order of the table is load-bearing, so it
// stays one explicit list rather than a map.

use chrono::{Datelike, Days, NaiveDate};
use regex::Regex;
use std::sync::LazyLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    SuggestSlots,
    CheckAppointment,
    PatientSummary,
}

/// Ordered (phrase, intent) rules. First phrase contained in the message wins.
const INTENT_RULES: &[(&str, Intent)] = &[
    // ถามเวลาว่าง/คิวว่างของหมอ
    ("เวลาว่างหมอ", Intent::SuggestSlots),
    ("คิวว่างหมอ", Intent::SuggestSlots),
    ("หมอว่างตอนไหน", Intent::SuggestSlots),
    ("หมอว่างเมื่อไหร่", Intent::SuggestSlots),
    ("หมอว่างวันไหน", Intent::SuggestSlots),
    ("ดูเวลาว่างหมอ", Intent::SuggestSlots),
    ("มีคิวหมอว่างไหม", Intent::SuggestSlots),
    ("คิวหมอว่างไหม", Intent::SuggestSlots),
    ("ขอเวลาว่างหมอ", Intent::SuggestSlots),
    ("หาคิวหมอ", Intent::SuggestSlots),
    ("เช็กคิวหมอว่าง", Intent::SuggestSlots),
    ("เช็คนัดหมอว่าง", Intent::SuggestSlots),
    ("ดูตารางหมอ", Intent::SuggestSlots),
    ("ดูตารางออกตรวจ", Intent::SuggestSlots),
    ("ตารางออกตรวจหมอ", Intent::SuggestSlots),
    ("มีคิวว่างไหม", Intent::SuggestSlots),
    ("มีเวลาว่างไหม", Intent::SuggestSlots),
    ("ช่องว่างในตาราง", Intent::SuggestSlots),
    ("ช่วงเวลาว่าง", Intent::SuggestSlots),
    // ตรวจสอบนัด / ดูคิว
    ("เช็กนัด", Intent::CheckAppointment),
    ("เช็คนัด", Intent::CheckAppointment),
    ("เช็คคิวนัด", Intent::CheckAppointment),
    ("เช็กคิว", Intent::CheckAppointment),
    ("เช็คคิว", Intent::CheckAppointment),
    ("ดูคิวนัด", Intent::CheckAppointment),
    ("ดูคิววันนี้", Intent::CheckAppointment),
    ("ดูคิวพรุ่งนี้", Intent::CheckAppointment),
    ("ดูนัดวันนี้", Intent::CheckAppointment),
    ("ดูนัดพรุ่งนี้", Intent::CheckAppointment),
    ("ตรวจสอบนัด", Intent::CheckAppointment),
    ("ตรวจนัด", Intent::CheckAppointment),
    ("เช็คว่ามีคิวนัดไหม", Intent::CheckAppointment),
    ("มีนัดไหม", Intent::CheckAppointment),
    ("วันนี้มีนัดอะไรบ้าง", Intent::CheckAppointment),
    ("วันนี้หมอมีนัดอะไรบ้าง", Intent::CheckAppointment),
    ("คิวนัดของคนไข้", Intent::CheckAppointment),
    ("ประวัตินัดหมาย", Intent::CheckAppointment),
    ("ดูตารางนัด", Intent::CheckAppointment),
    // สรุป/ดูประวัติคนไข้
    ("ประวัติคนไข้", Intent::PatientSummary),
    ("ดูประวัติคนไข้", Intent::PatientSummary),
    ("สรุปคนไข้", Intent::PatientSummary),
    ("สรุปข้อมูลคนไข้", Intent::PatientSummary),
    ("สรุปประวัติ", Intent::PatientSummary),
    ("ดูข้อมูลผู้ป่วย", Intent::PatientSummary),
    ("ดูข้อมูลคนไข้", Intent::PatientSummary),
    ("profile คนไข้", Intent::PatientSummary),
    ("รายละเอียดคนไข้", Intent::PatientSummary),
    ("ดึงข้อมูลคนไข้", Intent::PatientSummary),
    ("ประวัติการรักษา", Intent::PatientSummary),
    ("ประวัติรักษา", Intent::PatientSummary),
    ("เคยรักษาอะไรบ้าง", Intent::PatientSummary),
    ("เคยมาหาหมอเรื่องอะไรบ้าง", Intent::PatientSummary),
    ("การรักษาล่าสุด", Intent::PatientSummary),
    ("มารักษาล่าสุดเมื่อไหร่", Intent::PatientSummary),
];

pub fn detect_intent(message: &str) -> Option<Intent> {
    let msg = message.trim().to_lowercase();
    if msg.is_empty() {
        return None;
    }

    INTENT_RULES
        .iter()
        .find(|(phrase, _)| msg.contains(phrase))
        .map(|&(_, intent)| intent)
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Entities {
    pub patient_id: Option<i64>,
    pub doctor_id: Option<i64>,
    pub date: Option<NaiveDate>,
}

static PATIENT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"คนไข้\s*(\d+)").expect("patient pattern"));
static DOCTOR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(หมอ|แพทย์)(หมายเลข)?\s*(\d+)").expect("doctor pattern"));
static DAY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"วันที่\s*(\d+)").expect("day pattern"));

/// Pull patient id, doctor id, and a date out of a Thai sentence.
///
/// An explicit "วันที่ N" maps the day onto today's month and year; a day
/// that does not exist in the current month is silently dropped. The
/// relative words วันนี้/พรุ่งนี้ are checked afterwards, so they override
/// an explicit day when both appear.
pub fn extract_entities(message: &str, today: NaiveDate) -> Entities {
    let msg = message.to_lowercase();
    let mut entities = Entities::default();

    if let Some(caps) = PATIENT_RE.captures(&msg) {
        entities.patient_id = caps[1].parse().ok();
    }

    if let Some(caps) = DOCTOR_RE.captures(&msg) {
        entities.doctor_id = caps[3].parse().ok();
    }

    if let Some(caps) = DAY_RE.captures(&msg) {
        if let Ok(day) = caps[1].parse::<u32>() {
            entities.date = today.with_day(day);
        }
    }

    if msg.contains("วันนี้") {
        entities.date = Some(today);
    } else if msg.contains("พรุ่งนี้") {
        entities.date = today.checked_add_days(Days::new(1));
    }

    entities
}

#[cfg(test)]
mod tests {
    use super::*;

    fn nov_13() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 11, 13).unwrap()
    }

    #[test]
    fn slot_question_with_doctor_and_day() {
        let message = "ดูเวลาว่างหมอ 1 วันที่ 15";
        assert_eq!(detect_intent(message), Some(Intent::SuggestSlots));

        let entities = extract_entities(message, nov_13());
        assert_eq!(entities.doctor_id, Some(1));
        assert_eq!(entities.date, NaiveDate::from_ymd_opt(2025, 11, 15));
        assert_eq!(entities.patient_id, None);
    }

    #[test]
    fn first_matching_phrase_decides_the_intent() {
        assert_eq!(detect_intent("เช็กนัดหน่อย"), Some(Intent::CheckAppointment));
        assert_eq!(detect_intent("ขอดูประวัติคนไข้ 5"), Some(Intent::PatientSummary));
        assert_eq!(detect_intent("สวัสดีครับ"), None);
        assert_eq!(detect_intent("   "), None);
    }

    #[test]
    fn doctor_number_with_optional_prefix_word() {
        let entities = extract_entities("แพทย์หมายเลข 7 ว่างไหม", nov_13());
        assert_eq!(entities.doctor_id, Some(7));
    }

    #[test]
    fn impossible_day_of_month_is_dropped() {
        let entities = extract_entities("ดูเวลาว่างหมอ 1 วันที่ 31", nov_13());
        assert_eq!(entities.date, None);
    }

    #[test]
    fn relative_words_override_an_explicit_day() {
        let entities = extract_entities("ดูเวลาว่างหมอ 1 วันที่ 15 พรุ่งนี้", nov_13());
        assert_eq!(entities.date, NaiveDate::from_ymd_opt(2025, 11, 14));

        let entities = extract_entities("ดูเวลาว่างหมอ 1 วันนี้", nov_13());
        assert_eq!(entities.date, Some(nov_13()));
    }
}
