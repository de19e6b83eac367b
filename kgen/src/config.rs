use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::codegen::{self, KernelParams};
use crate::error::Error;

/// Header to scan, and how.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeaderConfig {
    pub path: String,
    /// Scan `#define` constants.
    pub constants: bool,
    /// Declaration prefixes of usable functions.
    pub signatures: Vec<String>,
    pub clip: bool,
}

impl Default for HeaderConfig {
    fn default() -> Self {
        HeaderConfig {
            path: String::new(),
            constants: false,
            signatures: vec![],
            clip: true,
        }
    }
}

impl HeaderConfig {
    /// Name used in the generated `#include`.
    pub fn include(&self) -> String {
        match Path::new(&self.path).file_name() {
            Some(name) => name.to_string_lossy().into_owned(),
            None => self.path.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub stack_size: usize,
    pub pixel_width: usize,
    pub domain_max: f32,
    pub block_size: usize,
    pub bss: u32,
    pub strict: bool,
    pub kernel_name: String,
    pub includes: Vec<String>,
    pub headers: Vec<HeaderConfig>,
}

const INCLUDE_DIR: &str = "/usr/local/cuda/include";

impl Default for Config {
    fn default() -> Self {
        let header = |name: &str| format!("{INCLUDE_DIR}/{name}");
        Config {
            stack_size: 64,
            pixel_width: 3,
            domain_max: 255.0,
            block_size: 1024,
            bss: 64,
            strict: true,
            kernel_name: "RPN".to_string(),
            includes: vec![],
            headers: vec![
                HeaderConfig {
                    path: header("math_constants.h"),
                    constants: true,
                    ..HeaderConfig::default()
                },
                HeaderConfig {
                    path: header("math_functions.h"),
                    signatures: vec![
                        "extern __host__ __device__ __device_builtin__ float".to_string(),
                        "extern __device__ __device_builtin__ __cudart_builtin__ float".to_string(),
                        "extern _CRTIMP __host__ __device__ __device_builtin__ float".to_string(),
                    ],
                    ..HeaderConfig::default()
                },
                HeaderConfig {
                    path: header("device_functions.h"),
                    signatures: vec![
                        "extern _CRTIMP __host__ __device__ __device_builtin__ float".to_string(),
                    ],
                    ..HeaderConfig::default()
                },
            ],
        }
    }
}

impl Config {
    pub fn from_yaml(text: &str) -> Result<Config, Error> {
        Ok(serde_yaml::from_str(text)?)
    }

    pub fn load(path: &str) -> Result<Config, Error> {
        let text =
            std::fs::read_to_string(path).map_err(|e| Error::FileOpen(path.to_string(), e))?;
        Config::from_yaml(&text)
    }

    pub fn to_yaml(&self) -> String {
        serde_yaml::to_string(self).unwrap_or_else(|e| format!("# Error generating YAML: {}", e))
    }

    pub fn assembler(&self) -> rpnasm::Config {
        rpnasm::Config {
            bss: self.bss,
            strict: self.strict,
        }
    }

    /// Generation parameters. `math.h` comes first, then every scanned
    /// header, then the extra includes.
    pub fn kernel(&self) -> Result<KernelParams, Error> {
        if self.stack_size == 0 {
            return Err(Error::Param("stack_size must be positive".to_string()));
        }
        if self.pixel_width == 0 {
            return Err(Error::Param("pixel_width must be positive".to_string()));
        }
        if !(self.domain_max > 0.0) {
            return Err(Error::Param(format!(
                "domain_max must be positive, got {}",
                self.domain_max
            )));
        }

        if !codegen::valid_entry_name(&self.kernel_name) {
            return Err(Error::Param(format!(
                "kernel_name `{}` is not a free identifier",
                self.kernel_name
            )));
        }

        let mut includes = vec!["math.h".to_string()];
        for name in self
            .headers
            .iter()
            .map(HeaderConfig::include)
            .chain(self.includes.iter().cloned())
        {
            if !includes.contains(&name) {
                includes.push(name);
            }
        }
        Ok(KernelParams {
            stack_size: self.stack_size,
            pixel_width: self.pixel_width,
            domain_max: self.domain_max,
            kernel_name: self.kernel_name.clone(),
            includes,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_yaml_is_default() {
        assert_eq!(Config::from_yaml("{}").unwrap(), Config::default());
    }

    #[test]
    fn partial_override() {
        let config = Config::from_yaml(
            "
stack_size: 16
strict: false
headers:
  - path: /opt/include/fastmath.h
    signatures: [\"static inline float\"]
",
        )
        .unwrap();
        assert_eq!(config.stack_size, 16);
        assert_eq!(config.pixel_width, 3);
        assert!(!config.strict);
        assert_eq!(config.headers.len(), 1);
        assert!(config.headers[0].clip);
        assert!(!config.headers[0].constants);
        assert_eq!(config.headers[0].include(), "fastmath.h");
    }

    #[test]
    fn bad_yaml() {
        assert!(matches!(
            Config::from_yaml("stack_size: lots"),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn kernel_includes_in_order() {
        let config = Config {
            includes: vec!["math.h".to_string(), "extra.h".to_string()],
            ..Config::default()
        };
        let params = config.kernel().unwrap();
        assert_eq!(
            params.includes,
            vec![
                "math.h",
                "math_constants.h",
                "math_functions.h",
                "device_functions.h",
                "extra.h"
            ]
        );
    }

    #[test]
    fn zero_sizes_rejected() {
        let config = Config {
            stack_size: 0,
            ..Config::default()
        };
        assert!(matches!(config.kernel(), Err(Error::Param(_))));
        let config = Config {
            domain_max: 0.0,
            ..Config::default()
        };
        assert!(matches!(config.kernel(), Err(Error::Param(_))));
    }

    #[test]
    fn clashing_kernel_name_rejected() {
        for name in ["RPNState", "RPNp", "machine", "rpn_op_0", "PUSH", "two words"] {
            let config = Config {
                kernel_name: name.to_string(),
                ..Config::default()
            };
            assert!(matches!(config.kernel(), Err(Error::Param(_))), "{name}");
        }
        assert_eq!(Config::default().kernel().unwrap().kernel_name, "RPN");
    }

    #[test]
    fn yaml_round_trip() {
        let config = Config::default();
        assert_eq!(Config::from_yaml(&config.to_yaml()).unwrap(), config);
    }
}
