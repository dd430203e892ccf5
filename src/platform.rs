use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    MacOS,
    Linux,
    Windows,
    Unknown,
}

pub fn detect() -> Platform {
    match std::env::consts::OS {
        "macos" => Platform::MacOS,
        "linux" => Platform::Linux,
        "windows" => Platform::Windows,
        _ => Platform::Unknown,
    }
}

/// A mounted volume that can serve as a scan root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Volume {
    pub device: String,
    pub mount_point: PathBuf,
}

/// Kernel and virtual filesystems nobody wants to catalogue.
const PSEUDO_FILESYSTEMS: &[&str] = &[
    "proc", "sysfs", "devtmpfs", "devpts", "tmpfs", "cgroup", "cgroup2", "mqueue", "debugfs",
    "tracefs", "securityfs", "pstore", "bpf", "configfs", "fusectl", "hugetlbfs", "autofs",
    "binfmt_misc", "efivarfs", "nsfs", "rpc_pipefs", "ramfs",
];

pub fn volumes() -> Vec<Volume> {
    match detect() {
        Platform::Linux => std::fs::read_to_string("/proc/self/mounts")
            .map(|text| parse_mounts(&text))
            .unwrap_or_default(),
        Platform::MacOS => {
            let mut found: Vec<Volume> = std::fs::read_dir("/Volumes")
                .map(|dir| {
                    dir.filter_map(|e| e.ok())
                        .map(|e| Volume {
                            device: e.file_name().to_string_lossy().into_owned(),
                            mount_point: e.path(),
                        })
                        .collect()
                })
                .unwrap_or_default();
            found.sort_by(|a, b| a.mount_point.cmp(&b.mount_point));
            found
        }
        Platform::Windows => (b'A'..=b'Z')
            .map(|letter| format!("{}:\\", letter as char))
            .filter(|root| std::path::Path::new(root).exists())
            .map(|root| Volume {
                device: root.trim_end_matches('\\').to_string(),
                mount_point: PathBuf::from(root),
            })
            .collect(),
        Platform::Unknown => vec![Volume {
            device: "/".to_string(),
            mount_point: PathBuf::from("/"),
        }],
    }
}

/// Parse /proc/mounts format: `device mount_point fstype options dump pass`.
pub fn parse_mounts(text: &str) -> Vec<Volume> {
    text.lines()
        .filter_map(|line| {
            let mut fields = line.split_whitespace();
            let device = fields.next()?;
            let mount_point = fields.next()?;
            let fstype = fields.next()?;

            if PSEUDO_FILESYSTEMS.contains(&fstype) {
                return None;
            }

            Some(Volume {
                device: unescape_mount(device),
                mount_point: PathBuf::from(unescape_mount(mount_point)),
            })
        })
        .collect()
}

// the kernel writes space, tab, newline and backslash as \ooo octal escapes
fn unescape_mount(field: &str) -> String {
    let bytes = field.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;

    while i < bytes.len() {
        let escape = bytes.get(i + 1..i + 4).filter(|digits| digits.iter().all(|b| (b'0'..=b'7').contains(b)));

        if let (b'\\', Some(digits)) = (bytes[i], escape) {
            let code = digits.iter().fold(0u16, |acc, d| acc * 8 + u16::from(d - b'0'));
            out.push(u8::try_from(code).unwrap_or(b'?'));
            i += 4;
        } else {
            out.push(bytes[i]);
            i += 1;
        }
    }

    String::from_utf8_lossy(&out).into_owned()
}
