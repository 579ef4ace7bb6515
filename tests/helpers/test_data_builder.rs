// ==========================================
// 测试数据构建器 - 用于引擎集成测试
// ==========================================

#![allow(dead_code)]

use chrono::NaiveDate;
use equipment_metrics::domain::maintenance::{EquipmentRecord, FailureRecord, OperatingRecord};
use equipment_metrics::domain::production::{DowntimeRecord, ProductionRecord};

pub fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

// ==========================================
// ProductionRecord 构建器
// ==========================================

pub struct ProductionBuilder {
    date: NaiveDate,
    entity_id: String,
    production_hours: f64,
    produced_units: u64,
    defect_units: u64,
    ideal_cycle_time: f64,
}

impl ProductionBuilder {
    pub fn new(entity_id: &str, date: NaiveDate) -> Self {
        Self {
            date,
            entity_id: entity_id.to_string(),
            production_hours: 8.0,
            produced_units: 100,
            defect_units: 0,
            ideal_cycle_time: 1.0,
        }
    }

    pub fn hours(mut self, hours: f64) -> Self {
        self.production_hours = hours;
        self
    }

    pub fn units(mut self, produced: u64, defects: u64) -> Self {
        self.produced_units = produced;
        self.defect_units = defects;
        self
    }

    pub fn cycle(mut self, minutes: f64) -> Self {
        self.ideal_cycle_time = minutes;
        self
    }

    pub fn build(self) -> ProductionRecord {
        ProductionRecord {
            date: self.date,
            entity_id: self.entity_id,
            production_hours: self.production_hours,
            produced_units: self.produced_units,
            defect_units: self.defect_units,
            ideal_cycle_time: self.ideal_cycle_time,
            row_number: 1,
        }
    }
}

pub fn downtime(entity_id: &str, date: NaiveDate, hours: f64) -> DowntimeRecord {
    DowntimeRecord {
        date,
        entity_id: entity_id.to_string(),
        downtime_hours: hours,
        row_number: 1,
    }
}

// ==========================================
// 维护记录
// ==========================================

pub fn operating(entity_id: &str, date: NaiveDate, hours: f64) -> OperatingRecord {
    OperatingRecord {
        entity_id: entity_id.to_string(),
        date,
        operating_hours: hours,
        row_number: 1,
    }
}

pub fn failure(entity_id: &str, date: NaiveDate) -> FailureRecord {
    FailureRecord {
        entity_id: entity_id.to_string(),
        failure_date: date,
        description: None,
        row_number: 1,
    }
}

pub fn equipment(entity_id: &str, manufacture: NaiveDate, expire: NaiveDate) -> EquipmentRecord {
    EquipmentRecord {
        entity_id: entity_id.to_string(),
        manufacture_date: manufacture,
        expire_date: expire,
        row_number: 1,
    }
}
