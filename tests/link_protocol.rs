//! Integration tests for the link protocol and the linker

use bridgegen::link::parse_link_text;
use bridgegen::model::SourceFile;
use bridgegen::{generate, link, GeneratorConfig, LinkError, LinkRecord, Linker};
use pretty_assertions::assert_eq;

fn link_text(model: &str) -> String {
    let file = SourceFile::from_toml(model).expect("Should parse model");
    generate(&file, &GeneratorConfig::default())
        .expect("Should generate")
        .link_text()
}

#[test]
fn test_bases_resolved_before_derived() {
    let text = link_text(include_str!("fixtures/grid.toml"));
    let out = link(&[text.as_str()]).expect("Should link");

    let lines: Vec<&str> = out.lines().collect();
    assert_eq!(
        lines,
        vec![
            r#"static const ScriptRegister _R_Grid_Real_size ("Grid<Real>","size",Grid<Real>::_W_size);"#,
            r#"static const ScriptRegister _R_Grid_Real ("Grid<Real>","Grid<Real>",""); template<> const char* Grid<Real>::_class = "Grid<Real>";"#,
            r#"static const ScriptRegister _R_Grid_Vec3_size ("Grid<Vec3>","size",Grid<Vec3>::_W_size);"#,
            r#"static const ScriptRegister _R_Grid_Vec3 ("Grid<Vec3>","Grid<Vec3>",""); template<> const char* Grid<Vec3>::_class = "Grid<Vec3>";"#,
            r#"static const ScriptRegister _R_MACGrid_Vec3 ("MACGrid<Vec3>","MACGrid<Vec3>","Grid<Vec3>"); template<> const char* MACGrid<Vec3>::_class = "MACGrid<Vec3>";"#,
        ]
    );
}

#[test]
fn test_records_from_several_files() {
    let grid = link_text(include_str!("fixtures/grid.toml"));
    let sphere = link_text(include_str!("fixtures/sphere.toml"));
    let extra = ">Grid^Real\n>Grid^int\n";

    let out = link(&[sphere.as_str(), grid.as_str(), extra]).expect("Should link");
    assert!(out.starts_with("static const ScriptRegister _R_Sphere_volume "));
    assert_eq!(out.matches("_R_Grid_Real (").count(), 1);
    assert!(out.contains("_R_Grid_int (\"Grid<int>\""));
}

#[test]
fn test_protocol_text_roundtrips_through_records() {
    let text = link_text(include_str!("fixtures/grid.toml"));
    let records = parse_link_text(&text).expect("Should decode");
    assert_eq!(records.len(), 6);
    assert_eq!(records[3], LinkRecord::depends_on("MACGrid", "T", "Grid", "T"));

    let mut linker = Linker::new();
    linker.add_records(records);
    assert_eq!(linker.resolve().expect("Should resolve").len(), 5);
}

#[test]
fn test_statement_may_contain_separator() {
    let records = parse_link_text("+A^x ^ y;\n\n>A^\n").expect("Should decode");
    assert_eq!(
        records,
        vec![LinkRecord::register("A", "x ^ y;"), LinkRecord::instantiate("A", "")]
    );
}

#[test]
fn test_malformed_line_reports_line_number() {
    let err = parse_link_text("+A^a;\n?junk\n").unwrap_err();
    assert_eq!(
        err,
        LinkError::Malformed {
            line: 2,
            text: "?junk".to_string(),
        }
    );
}

#[test]
fn test_instantiation_without_registration() {
    let err = link(&[">Grid^Real\n"]).unwrap_err();
    assert_eq!(err.to_string(), "instantiation of unknown class 'Grid<Real>'");
}

#[test]
fn test_same_link_file_twice_registers_once() {
    let sphere = link_text(include_str!("fixtures/sphere.toml"));
    let once = link(&[sphere.as_str()]).expect("Should link");
    let twice = link(&[sphere.as_str(), sphere.as_str()]).expect("Should link");

    assert_eq!(twice, once);
    assert_eq!(twice.matches("static const ScriptRegister _R_Sphere (").count(), 1);
}
