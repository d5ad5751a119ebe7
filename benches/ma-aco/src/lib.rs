use common::generator::{Cmd, Generator, instance_path};
use eyre::Result;
use serde::{Deserialize, Serialize};
use tracing::debug;

pub const EXECUTABLE: &str = "./benchmark.sh";

/// Results table columns for the memetic algorithm and ant colony runs,
/// in the order the benchmark driver prints them.
pub const COLUMNS: &[&str] = &[
    "Filename",
    "Seed",
    "Vars",
    "Clauses",
    "Population size",
    "Tournament size",
    "Mutation Prob.",
    "%Mutation",
    "%Elite",
    "Optimal found (MA)",
    "Time (MA)",
    "Ants",
    "Alpha",
    "Beta",
    "Rho",
    "Q0",
    "Tau0",
    "Optimal found (ACO)",
    "Time (ACO)",
];

/// Printed first so that running the output through a shell writes the
/// table header before the rows.
pub fn header() -> String {
    format!("echo -e \"{}\"", COLUMNS.join("\t"))
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InstanceSet {
    Max3Sat,
    #[default]
    Max4Sat,
    Max5Sat,
}

impl InstanceSet {
    pub fn dir(&self) -> &'static str {
        match self {
            InstanceSet::Max3Sat => "test_data/max_3_sat",
            InstanceSet::Max4Sat => "test_data/max_4_sat",
            InstanceSet::Max5Sat => "test_data/max_5_sat",
        }
    }
}

/// Memetic algorithm and ant colony run over every instance of a directory.
/// Solver parameters are fixed by the benchmark driver.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct MaAcoList {
    pub executable: String,
    pub set: InstanceSet,
    /// Takes precedence over `set`
    pub dir: Option<String>,
}

impl Default for MaAcoList {
    fn default() -> Self {
        Self {
            executable: EXECUTABLE.to_owned(),
            set: InstanceSet::default(),
            dir: None,
        }
    }
}

#[typetag::serde]
impl Generator for MaAcoList {
    fn name(&self) -> &'static str {
        "ma-aco"
    }

    fn dir(&self) -> &str {
        self.dir.as_deref().unwrap_or(self.set.dir())
    }

    fn header(&self) -> Option<String> {
        Some(header())
    }

    fn cmds(&self, listing: &[String]) -> Result<Vec<Cmd>> {
        let dir = Generator::dir(self);
        debug!("Listing all {} instances of {dir}", listing.len());
        Ok(listing
            .iter()
            .map(|name| Cmd::new(self.executable.clone(), vec![instance_path(dir, name)]))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use common::generator::write_cmds;

    use super::*;

    fn listing(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("uf{i}.cnf")).collect()
    }

    #[test]
    fn every_entry_is_listed() {
        let generator = MaAcoList::default();
        for n in [0, 1, 29, 30, 31, 100] {
            assert_eq!(generator.cmds(&listing(n)).unwrap().len(), n);
        }
    }

    #[test]
    fn line_is_executable_and_path() {
        let generator = MaAcoList {
            set: InstanceSet::Max3Sat,
            ..Default::default()
        };
        let cmds = generator.cmds(&listing(1)).unwrap();
        assert_eq!(cmds[0].to_string(), "./benchmark.sh test_data/max_3_sat/uf0.cnf");
    }

    #[test]
    fn explicit_dir_wins_over_set() {
        let generator = MaAcoList {
            set: InstanceSet::Max5Sat,
            dir: Some("bench/big".to_owned()),
            ..Default::default()
        };
        assert_eq!(Generator::dir(&generator), "bench/big");
        assert_eq!(
            generator.cmds(&listing(1)).unwrap()[0].args,
            vec!["bench/big/uf0.cnf"]
        );
    }

    #[test]
    fn header_is_a_tab_separated_echo() {
        let header = header();
        assert!(header.starts_with("echo -e \"Filename\tSeed\t"));
        assert!(header.ends_with("\tTime (ACO)\""));
        assert_eq!(header.matches('\t').count(), COLUMNS.len() - 1);
    }

    #[test]
    fn output_starts_with_header() {
        let generator = MaAcoList::default();
        let mut out = Vec::new();
        write_cmds(&generator, &listing(2), &mut out).unwrap();
        let out = String::from_utf8(out).unwrap();
        let lines = out.lines().collect::<Vec<_>>();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], header());
        assert_eq!(lines[2], "./benchmark.sh test_data/max_4_sat/uf1.cnf");
    }

    #[test]
    fn set_from_yaml() {
        let generator: MaAcoList = serde_yml::from_str("set: Max5Sat\n").unwrap();
        assert_eq!(Generator::dir(&generator), "test_data/max_5_sat");
    }
}
