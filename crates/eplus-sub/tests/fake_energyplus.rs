//! Runner tests against a stand-in `energyplus` shell script
#![cfg(unix)]

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use eplus_sub::prelude::*;
use eplus_sub::EnergyPlusRunner;
use serial_test::serial;
use tempfile::TempDir;

const TEMPLATE: &str = "\
Schedule:Compact,
    HTGSETP_SCH_NO_OPTIMUM,  !- Name
    Temperature,             !- Schedule Type Limits Name
    Through: 12/31,          !- Field 1
    For: AllDays,            !- Field 2
    Until: 24:00,            !- Field 3
    20.0;                    !- Field 4
";

/// Parses the EnergyPlus flags, echoes the heating setpoint and working directory.
const FAKE_EPLUS: &str = r#"#!/bin/sh
while [ $# -gt 0 ]; do
    case "$1" in
        -w) weather="$2"; shift 2 ;;
        -d) outdir="$2"; shift 2 ;;
        -p) prefix="$2"; shift 2 ;;
        -r) shift ;;
        *) input="$1"; shift ;;
    esac
done
[ -f "$weather" ] || exit 2
touch "${input%.idf}.rvi"
value=$(grep 'Field 4' "$input" | sed 's/^ *\([^,;]*\).*/\1/')
printf 'Date/Time,HTG Setpoint [C](Hourly) ,Workdir\n 01/01  01:00:00,%s,%s\n' "$value" "$(pwd)" > "$outdir/${prefix}out.csv"
"#;

struct Sandbox {
    dir: TempDir,
    template: PathBuf,
    weather: PathBuf,
}

impl Sandbox {
    fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let template = dir.path().join("model.idf");
        let weather = dir.path().join("site.epw");
        fs::write(&template, TEMPLATE).unwrap();
        fs::write(&weather, "LOCATION,Inchon\n").unwrap();
        fs::create_dir(dir.path().join("runs")).unwrap();
        Self { dir, template, weather }
    }

    fn script(&self, name: &str, body: &str) -> PathBuf {
        let path = self.dir.path().join(name);
        fs::write(&path, body).unwrap();
        let mut perms = fs::metadata(&path).unwrap().permissions();
        perms.set_mode(0o755);
        fs::set_permissions(&path, perms).unwrap();
        path
    }

    fn runs(&self) -> PathBuf {
        self.dir.path().join("runs")
    }

    fn runner(&self, exe: &Path) -> EnergyPlusRunner {
        EnergyPlusRunner::new()
            .with_executable(exe.to_string_lossy())
            .with_tmp_dir_prefix(self.runs())
    }
}

#[test]
#[serial]
fn test_runs_in_private_directory() {
    let sb = Sandbox::new();
    let exe = sb.script("energyplus", FAKE_EPLUS);
    let cwd_before = std::env::current_dir().unwrap();

    let table = sb.runner(&exe).run(&sb.template, &sb.weather, false).unwrap();

    assert_eq!(table.len(), 1);
    assert_eq!(table.column_f64("HTG Setpoint [C](Hourly)").unwrap(), vec![20.0]);

    let workdir = PathBuf::from(table.column("Workdir").unwrap()[0]);
    assert_eq!(
        workdir.parent().map(|p| p.canonicalize().unwrap()),
        Some(sb.runs().canonicalize().unwrap())
    );
    assert!(!workdir.exists(), "run directory should be removed");
    assert!(!sb.dir.path().join("model.rvi").exists(), "artifacts stay out of the source dir");
    assert_eq!(std::env::current_dir().unwrap(), cwd_before);
}

#[test]
#[serial]
fn test_substitutor_batch_with_runner() {
    let sb = Sandbox::new();
    let exe = sb.script("energyplus", FAKE_EPLUS);
    let substitutor = Substitutor::new(sb.runner(&exe)).with_workspace_dir(sb.dir.path());

    let request = SubstitutionRequest::new().with(
        "Schedule:Compact",
        "HTGSETP_SCH_NO_OPTIMUM",
        "Field 4",
        vec![18.5, 19.0, 21.0],
    );
    let outputs = substitutor
        .dispatch(&sb.template, Some(sb.weather.as_path()), &request, false)
        .unwrap()
        .into_vec();

    let values: Vec<f64> = outputs
        .iter()
        .map(|o| o.as_table().unwrap().column_f64("HTG Setpoint [C](Hourly)").unwrap()[0])
        .collect();
    assert_eq!(values, vec![18.5, 19.0, 21.0]);
    assert_eq!(fs::read_dir(sb.runs()).unwrap().count(), 0);
}

#[test]
#[serial]
fn test_nonzero_exit_fails_by_default() {
    let sb = Sandbox::new();
    let exe = sb.script("energyplus", "#!/bin/sh\nexit 3\n");

    let err = sb.runner(&exe).run(&sb.template, &sb.weather, false).unwrap_err();
    assert!(matches!(err, SubError::SimulationFailed { .. }));
}

#[test]
#[serial]
fn test_nonzero_exit_tolerated_when_allowed() {
    let sb = Sandbox::new();
    let exe = sb.script("energyplus", "#!/bin/sh\nexit 3\n");
    let err = sb
        .runner(&exe)
        .allow_failed_runs()
        .run(&sb.template, &sb.weather, false)
        .unwrap_err();
    assert!(matches!(err, SubError::ResultMissing { .. }));

    let partial = format!("{}exit 1\n", FAKE_EPLUS);
    let exe = sb.script("energyplus-partial", &partial);
    let table = sb
        .runner(&exe)
        .allow_failed_runs()
        .run(&sb.template, &sb.weather, false)
        .unwrap();
    assert_eq!(table.len(), 1);
}

#[test]
#[serial]
fn test_missing_weather_surfaces_as_failure() {
    let sb = Sandbox::new();
    let exe = sb.script("energyplus", FAKE_EPLUS);

    let err = sb
        .runner(&exe)
        .run(&sb.template, &sb.dir.path().join("absent.epw"), false)
        .unwrap_err();
    assert!(matches!(err, SubError::SimulationFailed { .. }));
}
