#![allow(dead_code)]

use chrono::NaiveDate;
use mt4tester::domain::data_dir::{MARKER_FILE, REQUIRED_SUBDIRS};
use mt4tester::domain::error::TesterError;
use mt4tester::domain::request::{ParamValue, Parameter, RunRequest, TestModel};
use mt4tester::domain::terminal::TerminalCommand;
use mt4tester::ports::terminal_port::TerminalPort;
use std::cell::RefCell;
use std::fs;
use std::path::{Path, PathBuf};

/// Records every command and answers with a scripted exit code.
pub struct MockTerminal {
    pub code: Option<i32>,
    pub commands: RefCell<Vec<TerminalCommand>>,
    /// Contents of the settings file at launch time.
    pub settings_seen: RefCell<Vec<String>>,
}

impl MockTerminal {
    pub fn exiting_with(code: i32) -> Self {
        Self {
            code: Some(code),
            commands: RefCell::new(Vec::new()),
            settings_seen: RefCell::new(Vec::new()),
        }
    }

    pub fn killed() -> Self {
        Self {
            code: None,
            ..Self::exiting_with(0)
        }
    }

    pub fn launches(&self) -> usize {
        self.commands.borrow().len()
    }
}

impl TerminalPort for MockTerminal {
    fn execute(&self, command: &TerminalCommand) -> Result<Option<i32>, TesterError> {
        let settings = command.args.last().cloned().unwrap_or_default();
        self.settings_seen
            .borrow_mut()
            .push(fs::read_to_string(settings).unwrap_or_default());
        self.commands.borrow_mut().push(command.clone());
        Ok(self.code)
    }
}

pub fn create_subdirs(path: &Path) {
    for parts in REQUIRED_SUBDIRS {
        let dir = parts.iter().fold(path.to_path_buf(), |p, part| p.join(part));
        fs::create_dir_all(dir).unwrap();
    }
}

pub fn utf16_marker(text: &str) -> Vec<u8> {
    let mut bytes = vec![0xFF, 0xFE];
    for unit in text.encode_utf16() {
        bytes.extend_from_slice(&unit.to_le_bytes());
    }
    bytes
}

/// An install directory plus a per-user data root holding its data directory.
pub struct FakeTerminal {
    pub install: tempfile::TempDir,
    pub root: tempfile::TempDir,
    pub data: PathBuf,
}

impl FakeTerminal {
    /// Install directory usable in isolated mode, data directory for per-user mode.
    pub fn new() -> Self {
        let install = tempfile::tempdir().unwrap();
        create_subdirs(install.path());
        let root = tempfile::tempdir().unwrap();
        let data = root.path().join("7269C010EA668AEAE793BEE37C26ED57");
        fs::create_dir(&data).unwrap();
        create_subdirs(&data);
        fs::write(
            data.join(MARKER_FILE),
            utf16_marker(install.path().to_str().unwrap()),
        )
        .unwrap();
        Self {
            install,
            root,
            data,
        }
    }

    pub fn install_path(&self) -> &Path {
        self.install.path()
    }

    pub fn root_path(&self) -> PathBuf {
        self.root.path().to_path_buf()
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn sample_request() -> RunRequest {
    RunRequest {
        expert: "SampleEA".into(),
        parameters: vec![
            Parameter {
                name: "Lots".into(),
                value: ParamValue::numeric(0.1),
            },
            Parameter {
                name: "TakeProfit".into(),
                value: ParamValue::optimized(20.0, 10.0, 100.0),
            },
            Parameter {
                name: "Comment".into(),
                value: ParamValue::text("sample"),
            },
        ],
        symbol: "USDJPY".into(),
        period: "M5".into(),
        from_date: date(2014, 9, 1),
        to_date: date(2015, 1, 5),
        model: TestModel::EveryTick,
        spread: 5,
        replace_report: false,
        read_report: true,
        use_isolated_data_dir: false,
    }
}

pub fn write_temp_ini(content: &str) -> tempfile::NamedTempFile {
    use std::io::Write;
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}
