use super::{SourceError, TableSource};
use crate::model::{CellValue, Field, FieldType, Row};
use chrono::NaiveDate;

/// Demo table served when the host SDK is unavailable.
#[derive(Debug, Clone, Default)]
pub struct MockSource;

type Record = (&'static str, &'static str, &'static str, &'static str, f64, (u32, u32), &'static str);

// start dates are all in 2024, as (month, day)
const RECORDS: [Record; 5] = [
    ("美国", "洛杉矶", "张三", "A项目", 1_000_000.0, (1, 1), "进行中"),
    ("美国", "洛杉矶", "李四", "B项目", 800_000.0, (2, 1), "已完成"),
    ("美国", "夏威夷", "王五", "C项目", 600_000.0, (3, 1), "规划中"),
    ("加拿大", "多伦多", "赵六", "D项目", 1_200_000.0, (1, 15), "进行中"),
    ("加拿大", "温哥华", "钱七", "E项目", 900_000.0, (2, 15), "进行中"),
];

impl TableSource for MockSource {
    fn fields(&mut self) -> Result<Vec<Field>, SourceError> {
        let required = |mut f: Field| {
            f.required = true;
            f
        };
        Ok(vec![
            required(Field::new("country", "国家", FieldType::Text)),
            required(Field::new("region", "地区", FieldType::Text)),
            required(Field::new("manager", "负责人", FieldType::Text)),
            required(Field::new("project", "负责项目", FieldType::Text)),
            Field::new("budget", "预算", FieldType::Number),
            Field::new("start_date", "开始日期", FieldType::Date),
            Field::new("status", "状态", FieldType::Select),
        ])
    }

    fn rows(&mut self) -> Result<Vec<Row>, SourceError> {
        Ok(RECORDS
            .iter()
            .map(|&(country, region, manager, project, budget, (month, day), status)| {
                let start = NaiveDate::from_ymd_opt(2024, month, day)
                    .map(CellValue::Date)
                    .unwrap_or(CellValue::Null);
                Row::from([
                    ("country".to_string(), CellValue::from(country)),
                    ("region".to_string(), CellValue::from(region)),
                    ("manager".to_string(), CellValue::from(manager)),
                    ("project".to_string(), CellValue::from(project)),
                    ("budget".to_string(), CellValue::Number(budget)),
                    ("start_date".to_string(), start),
                    ("status".to_string(), CellValue::from(status)),
                ])
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rows_cover_every_field() {
        let mut source = MockSource;
        let fields = source.fields().unwrap();
        for row in source.rows().unwrap() {
            for field in &fields {
                assert!(row.contains_key(&field.id), "missing {}", field.id);
            }
        }
    }

    #[test]
    fn test_start_dates_are_dates() {
        let rows = MockSource.rows().unwrap();
        assert_eq!(
            rows[3]["start_date"],
            CellValue::Date(NaiveDate::from_ymd_opt(2024, 1, 15).unwrap())
        );
        assert_eq!(rows[0]["start_date"].to_string(), "2024-01-01");
    }
}
