//! CMake project blueprints.
//!
//! One generated `main.<ext>` source file plus a `CMakeLists.txt`, compiled
//! by invoking `cmake` twice (configure, then build) in a `build/`
//! subdirectory. Works with any compiler cmake can drive, so the final
//! binary is searched for in the locations the common generators use.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::debug;

use strand_compose::{
    BinaryDependency, BlueprintSpec, BuildOptions, BuildPlan, ComposeError, ComposeResult,
    Dependency, Metadata,
};
use strand_core::options::Configuration;
use strand_core::{run, substitute, Invocation, Mode};

const MAIN_TEMPLATE: &str = include_str!("../templates/main.c");
const CMAKELISTS_TEMPLATE: &str = include_str!("../templates/CMakeLists.txt");

/// Callsite inside the generated `main` function. Both `argc` and `argv`
/// are in scope; return values are ignored.
pub const CALLSITE_MAIN: &str = "main";

/// A simple CMake project blueprint, parameterized over the source language.
pub struct CMakeBlueprint {
    metadata: Metadata,
    extension: &'static str,
}

impl CMakeBlueprint {
    /// The `cmake-c` blueprint.
    pub fn c() -> Self {
        Self {
            metadata: Metadata::new("cmake-c", "1.0.0")
                .verbose_name("CMake C Project")
                .description("A simple CMake C project blueprint")
                .kind("c"),
            extension: "c",
        }
    }

    /// The `cmake-cpp` blueprint.
    pub fn cpp() -> Self {
        Self {
            metadata: Metadata::new("cmake-cpp", "1.0.0")
                .verbose_name("CMake C++ Project")
                .description("A simple CMake C++ project blueprint")
                .kind("cpp"),
            extension: "cpp",
        }
    }

    fn cmake(&self) -> BinaryDependency {
        BinaryDependency::new("cmake")
            .env_var("STRAND_CMAKE")
            .help("https://cmake.org/download/")
    }

    /// Compilers differ on where they leave the binary, so try the
    /// locations the common generators use.
    fn binary(&self, build_directory: &Path, name: &str) -> ComposeResult<PathBuf> {
        let locations = [
            build_directory.join(name),
            build_directory.join("Debug").join(format!("{name}.exe")),
        ];

        locations
            .iter()
            .find(|location| location.is_file())
            .cloned()
            .ok_or_else(|| ComposeError::BuildFailure {
                what: "unsupported compiler - could not find the final binary".to_string(),
            })
    }

    fn invoke(
        &self,
        cmake: &Path,
        args: &[&str],
        build_directory: &Path,
        options: &BuildOptions,
        failure: &str,
    ) -> ComposeResult<()> {
        let mut invocation = Invocation::new(cmake.to_string_lossy()).cwd(build_directory);
        for arg in args {
            invocation = invocation.arg(*arg);
        }
        invocation.env = options.env.clone();
        invocation.stdout = options.stdout.clone();
        invocation.stderr = options.stderr.clone();

        run(&invocation).map_err(|e| {
            debug!(error = %e, "cmake invocation failed");
            ComposeError::BuildFailure {
                what: failure.to_string(),
            }
        })
    }
}

impl BlueprintSpec for CMakeBlueprint {
    fn metadata(&self) -> Metadata {
        self.metadata.clone()
    }

    fn callsites(&self) -> Vec<String> {
        vec![CALLSITE_MAIN.to_string()]
    }

    fn generate(&self, plan: &BuildPlan, directory: &Path) -> ComposeResult<Vec<PathBuf>> {
        let mut parameters: Configuration = BTreeMap::new();
        parameters.insert("functions".to_string(), plan.functions.join("\n"));
        parameters.insert(
            "main".to_string(),
            plan.calls
                .get(CALLSITE_MAIN)
                .map(|calls| calls.join("\n    "))
                .unwrap_or_default(),
        );

        // Safe mode so component-emitted text is never reinterpreted.
        let source = substitute(MAIN_TEMPLATE, Mode::Safe, &parameters)?;

        // Directives that reject zero arguments are dropped when empty.
        let include_directories = if plan.include_dirs.is_empty() {
            String::new()
        } else {
            format!("include_directories({})", plan.include_dirs.join(" "))
        };
        let link_libraries = if plan.libraries.is_empty() {
            String::new()
        } else {
            format!(
                "target_link_libraries({} {})",
                plan.build_name,
                plan.libraries.join(" ")
            )
        };

        let mut parameters: Configuration = BTreeMap::new();
        parameters.insert("name".to_string(), plan.build_name.clone());
        parameters.insert("extension".to_string(), self.extension.to_string());
        parameters.insert("include_directories".to_string(), include_directories);
        parameters.insert("link_libraries".to_string(), link_libraries);

        // Safe mode again: cmake's own ${VAR} references survive verbatim.
        let cmakelists = substitute(CMAKELISTS_TEMPLATE, Mode::Safe, &parameters)?;

        let sourcefile = directory.join(format!("main.{}", self.extension));
        fs::write(&sourcefile, source)?;
        fs::write(directory.join("CMakeLists.txt"), cmakelists)?;

        Ok(vec![sourcefile])
    }

    fn compile(
        &self,
        plan: &BuildPlan,
        directory: &Path,
        options: &BuildOptions,
    ) -> ComposeResult<Vec<PathBuf>> {
        let cmake = self.cmake().find().ok_or_else(|| ComposeError::BuildFailure {
            what: "cmake not found".to_string(),
        })?;

        let build_directory = directory.join("build");
        if !build_directory.exists() {
            fs::create_dir_all(&build_directory)?;
        }

        self.invoke(
            &cmake,
            &[".."],
            &build_directory,
            options,
            "cmake invocation failed",
        )?;
        self.invoke(
            &cmake,
            &["--build", "."],
            &build_directory,
            options,
            "make invocation failed",
        )?;

        Ok(vec![self.binary(&build_directory, &plan.build_name)?])
    }

    fn dependencies(&self) -> Vec<Arc<dyn Dependency>> {
        vec![Arc::new(self.cmake())]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plan() -> BuildPlan {
        BuildPlan {
            build_name: "demo".to_string(),
            functions: vec!["void f_abc(void) {}".to_string()],
            calls: BTreeMap::from([(
                CALLSITE_MAIN.to_string(),
                vec!["f_abc();".to_string()],
            )]),
            libraries: Vec::new(),
            include_dirs: Vec::new(),
        }
    }

    #[test]
    fn generate_writes_source_and_cmakelists() {
        let dir = tempfile::tempdir().unwrap();
        let blueprint = CMakeBlueprint::c();

        let sources = blueprint.generate(&plan(), dir.path()).unwrap();
        assert_eq!(sources, vec![dir.path().join("main.c")]);

        let main = fs::read_to_string(&sources[0]).unwrap();
        assert!(main.contains("void f_abc(void) {}"));
        assert!(main.contains("f_abc();"));

        let cmakelists = fs::read_to_string(dir.path().join("CMakeLists.txt")).unwrap();
        assert!(cmakelists.contains("project(demo)"));
        assert!(cmakelists.contains("add_executable(demo main.c)"));
        // Empty aggregates leave no zero-argument directives behind.
        assert!(!cmakelists.contains("target_link_libraries"));
        assert!(!cmakelists.contains("include_directories("));
    }

    #[test]
    fn generate_links_libraries() {
        let dir = tempfile::tempdir().unwrap();
        let blueprint = CMakeBlueprint::cpp();

        let mut plan = plan();
        plan.libraries = vec!["z".to_string(), "curl".to_string()];
        plan.include_dirs = vec!["/opt/include".to_string()];
        blueprint.generate(&plan, dir.path()).unwrap();

        let cmakelists = fs::read_to_string(dir.path().join("CMakeLists.txt")).unwrap();
        assert!(cmakelists.contains("target_link_libraries(demo z curl)"));
        assert!(cmakelists.contains("include_directories(/opt/include)"));
        assert!(cmakelists.contains("add_executable(demo main.cpp)"));
    }

    #[test]
    fn missing_binary_is_a_build_failure() {
        let dir = tempfile::tempdir().unwrap();
        let err = CMakeBlueprint::c().binary(dir.path(), "demo").unwrap_err();
        assert!(matches!(err, ComposeError::BuildFailure { .. }));
    }
}
