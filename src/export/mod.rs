//! Attendance report rows and their spreadsheet / printable renderings.
//!
//! Lateness and presence cells are taken from the time calculator so an
//! exported report always matches what the dashboards show.

pub mod html;
pub mod xlsx;

use chrono::NaiveDateTime;
use serde::Serialize;
use utoipa::ToSchema;

use crate::model::attendance::AttendanceRecord;
use crate::model::settings::ExpectedStart;
use crate::utils::time_calc::{self, Lateness, Presence};

pub const COLUMNS: [&str; 9] = [
    "Fecha",
    "Nombre",
    "Rol",
    "Entrada",
    "Salida",
    "Inicio Almuerzo",
    "Fin Almuerzo",
    "Atraso (min)",
    "Estado",
];

/// One employee's record joined with who they are.
#[derive(Debug, Clone)]
pub struct ReportEntry {
    pub name: String,
    pub rol: String,
    pub identification: String,
    pub record: AttendanceRecord,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ReportRow {
    #[schema(example = "2026-03-02")]
    pub fecha: String,
    #[schema(example = "Ana Martínez")]
    pub nombre: String,
    #[schema(example = "Secretario")]
    pub rol: String,
    #[schema(example = "0102030405")]
    pub identificacion: String,
    #[schema(example = "07:15")]
    pub entrada: String,
    #[schema(example = "16:00")]
    pub salida: String,
    #[schema(example = "12:00")]
    pub inicio_almuerzo: String,
    #[schema(example = "12:45")]
    pub fin_almuerzo: String,
    /// Absent when there is no check-in to judge.
    #[schema(example = 15, nullable = true)]
    pub atraso_min: Option<i64>,
    #[schema(example = "15 minutos")]
    pub atraso: String,
    #[schema(example = "Presente")]
    pub estado: String,
    pub presente: bool,
    #[schema(example = "8:00")]
    pub horas: String,
}

impl ReportRow {
    pub fn build(entry: &ReportEntry, expected: ExpectedStart, now: NaiveDateTime) -> Self {
        let record = &entry.record;
        let late = time_calc::lateness(record, expected);
        let presence = time_calc::presence_status(record);

        Self {
            fecha: record.date.format("%Y-%m-%d").to_string(),
            nombre: entry.name.clone(),
            rol: entry.rol.clone(),
            identificacion: entry.identification.clone(),
            entrada: time_calc::display_time(record.enter.as_deref()),
            salida: time_calc::display_time(record.exit.as_deref()),
            inicio_almuerzo: time_calc::display_time(record.lunch_start.as_deref()),
            fin_almuerzo: time_calc::display_time(record.lunch_end.as_deref()),
            atraso_min: match late {
                Lateness::NotApplicable => None,
                other => Some(other.minutes()),
            },
            atraso: late.label(),
            estado: presence.label().to_string(),
            presente: presence == Presence::Present,
            horas: time_calc::elapsed_worked(record, now).clock_label(),
        }
    }

    /// Text cells in `COLUMNS` order.
    pub fn cells(&self) -> [String; 9] {
        [
            self.fecha.clone(),
            self.nombre.clone(),
            self.rol.clone(),
            self.entrada.clone(),
            self.salida.clone(),
            self.inicio_almuerzo.clone(),
            self.fin_almuerzo.clone(),
            self.atraso_min
                .map(|m| m.to_string())
                .unwrap_or_else(|| "N/A".to_string()),
            self.estado.clone(),
        ]
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use chrono::NaiveDate;

    pub(crate) fn entry(name: &str, enter: Option<&str>, exit: Option<&str>) -> ReportEntry {
        let date = NaiveDate::from_ymd_opt(2026, 3, 2).unwrap();
        ReportEntry {
            name: name.to_string(),
            rol: "Motorizado".to_string(),
            identification: "0911111111".to_string(),
            record: AttendanceRecord {
                enter: enter.map(str::to_string),
                exit: exit.map(str::to_string),
                ..AttendanceRecord::new(5, date)
            },
        }
    }

    pub(crate) fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 3, 2)
            .unwrap()
            .and_hms_opt(18, 0, 0)
            .unwrap()
    }

    pub(crate) fn seven() -> ExpectedStart {
        "07:00".parse().unwrap()
    }

    #[test]
    fn late_present_row() {
        let row = ReportRow::build(&entry("Luis", Some("07:15:00"), Some("16:00")), seven(), now());
        assert_eq!(
            row.cells(),
            [
                "2026-03-02", "Luis", "Motorizado", "07:15", "16:00", "N/A", "N/A", "15", "Presente"
            ]
            .map(String::from)
        );
        assert_eq!(row.atraso, "15 minutos");
        assert_eq!(row.horas, "8:45");
        assert!(row.presente);
    }

    #[test]
    fn on_time_row_reports_zero_minutes() {
        let row = ReportRow::build(&entry("Ana", Some("06:55"), None), seven(), now());
        assert_eq!(row.atraso_min, Some(0));
        assert_eq!(row.atraso, "A tiempo");
    }

    #[test]
    fn absent_row() {
        let row = ReportRow::build(&entry("Eva", None, None), seven(), now());
        assert_eq!(row.atraso_min, None);
        assert_eq!(row.cells()[7], "N/A");
        assert_eq!(row.estado, "Falto");
        assert_eq!(row.horas, "No iniciado");
        assert!(!row.presente);
    }
}
