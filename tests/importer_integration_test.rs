// ==========================================
// ForecastImporter 导入集成测试
// ==========================================
// 测试目标: CSV → 校验 → 落库;行级失败上报;同键覆盖
// ==========================================


use std::io::Write;
use std::sync::Arc;

use demand_planning_dss::importer::{ForecastImporter, ImportError};
use test_helpers::{make_date, setup_test_db};

fn write_csv(lines: &[&str]) -> tempfile::NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
    for line in lines {
        writeln!(file, "{}", line).unwrap();
    }
    file
}

#[tokio::test]
async fn test_import_csv_end_to_end() {
    let db = setup_test_db();
    let importer = ForecastImporter::new(db.forecast_repo.clone());

    let file = write_csv(&[
        "date,product_id,location_id,customer_id,forecast,actual",
        "2026-03-01,P001,WH01,C001,120.5,98",
        "2026-03-02,P001,WH01,,130,",
        "2026-03-03,P002,WH02,,85,80",
    ]);

    let report = importer.import_file(file.path()).await.unwrap();

    assert_eq!(report.total_rows, 3);
    assert_eq!(report.imported, 3);
    assert!(report.failures.is_empty());

    // 落库校验
    let series = db
        .forecast_repo
        .find_series("P001", "WH01", make_date(2026, 3, 1), make_date(2026, 3, 31))
        .unwrap();
    assert_eq!(series.len(), 2);
    assert_eq!(series[0].forecast, Some(120.5));
    assert_eq!(series[0].customer_id, Some("C001".to_string()));
    assert_eq!(series[1].actual, None);
}

#[tokio::test]
async fn test_import_collects_bad_rows_without_blocking() {
    let db = setup_test_db();
    let importer = ForecastImporter::new(db.forecast_repo.clone());

    let file = write_csv(&[
        "date,product_id,location_id,forecast",
        "2026-03-01,P001,WH01,100",
        "not-a-date,P001,WH01,100",   // 日期非法
        "2026-03-03,P001,WH01,-5",    // 负值
        "2026-03-04,,WH01,100",       // 缺产品 (空值视为缺失)
        "2026-03-05,P001,WH01,120",
    ]);

    let report = importer.import_file(file.path()).await.unwrap();

    // 坏行上报,好行照常入库
    assert_eq!(report.total_rows, 5);
    assert_eq!(report.imported, 2);
    assert_eq!(report.failures.len(), 3);

    let failed_rows: Vec<_> = report.failures.iter().map(|f| f.row_index).collect();
    assert_eq!(failed_rows, vec![2, 3, 4]);
}

#[tokio::test]
async fn test_import_unsupported_extension() {
    let db = setup_test_db();
    let importer = ForecastImporter::new(db.forecast_repo.clone());

    let file = tempfile::Builder::new().suffix(".txt").tempfile().unwrap();
    let err = importer.import_file(file.path()).await.unwrap_err();
    assert!(matches!(err, ImportError::UnsupportedFormat(_)));
}

#[tokio::test]
async fn test_import_files_concurrently() {
    let db = setup_test_db();
    let importer = Arc::new(ForecastImporter::new(db.forecast_repo.clone()));

    let file_a = write_csv(&[
        "date,product_id,location_id,forecast",
        "2026-03-01,P001,WH01,10",
    ]);
    let file_b = write_csv(&[
        "date,product_id,location_id,forecast",
        "2026-03-01,P002,WH01,20",
    ]);

    let paths = vec![
        file_a.path().to_string_lossy().to_string(),
        file_b.path().to_string_lossy().to_string(),
        "missing.csv".to_string(), // 单文件失败不影响其它文件
    ];

    let reports = importer.import_files(&paths).await;

    assert_eq!(reports.len(), 3);
    assert!(reports[0].is_ok());
    assert!(reports[1].is_ok());
    assert!(reports[2].is_err());
}
