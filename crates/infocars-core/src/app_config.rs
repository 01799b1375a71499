use std::net::SocketAddr;

/// FIPE vehicle category, used as the first path segment of every endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VehicleKind {
    #[default]
    Cars,
    Motorcycles,
    Trucks,
}

impl VehicleKind {
    #[must_use]
    pub fn path_segment(self) -> &'static str {
        match self {
            VehicleKind::Cars => "carros",
            VehicleKind::Motorcycles => "motos",
            VehicleKind::Trucks => "caminhoes",
        }
    }
}

impl std::fmt::Display for VehicleKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.path_segment())
    }
}

impl std::str::FromStr for VehicleKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "carros" | "cars" => Ok(VehicleKind::Cars),
            "motos" | "motorcycles" => Ok(VehicleKind::Motorcycles),
            "caminhoes" | "trucks" => Ok(VehicleKind::Trucks),
            other => Err(format!(
                "unknown vehicle kind '{other}' (expected carros, motos or caminhoes)"
            )),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub api_base_url: String,
    pub vehicle_kind: VehicleKind,
    pub bind_addr: SocketAddr,
    pub log_level: String,
    /// `None` leaves requests without a deadline.
    pub request_timeout_secs: Option<u64>,
    pub user_agent: String,
}
