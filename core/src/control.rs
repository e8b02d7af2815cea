//! Automatic actuator control
//!
//! Every device is judged on its own reading. A device is switched on once
//! its reading crosses the threshold and only switched off again after the
//! reading reached the ideal value, everything in between keeps the state.

use crate::error::CoreError;
use crate::log::{LogEntry, LogLevel};
use crate::readings::{CnsRecord, Dns2Record, DnsRecord};
use crate::value::{parse_number, parse_switch};
use serde::{Deserialize, Serialize};
use std::fmt;
use utoipa::ToSchema;

const AUTO: &str = "自动控制";
const MANUAL: &str = "手动控制";

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AutoControlSettings {
    /// °C from which the fan is switched on
    pub temperature_threshold: f64,
    /// °C at which a running fan is switched off
    pub ideal_temperature: f64,
    /// Fan speed in percent
    pub fan_speed: u8,
    /// lx below which the grow light is switched on
    pub light_threshold: f64,
    /// g/kg from which the pump is switched on
    pub soil_salinity_threshold: f64,
    /// g/kg at which a running pump is switched off
    pub ideal_soil_salinity: f64,
    /// Pump speed in percent
    pub pump_speed: u8,
}

impl Default for AutoControlSettings {
    fn default() -> Self {
        AutoControlSettings {
            temperature_threshold: 28.0,
            ideal_temperature: 24.0,
            fan_speed: 80,
            light_threshold: 500.0,
            soil_salinity_threshold: 8.0,
            ideal_soil_salinity: 5.0,
            pump_speed: 70,
        }
    }
}

impl AutoControlSettings {
    pub fn validate(&self) -> Result<(), CoreError> {
        let values = [
            ("temperatureThreshold", self.temperature_threshold),
            ("idealTemperature", self.ideal_temperature),
            ("lightThreshold", self.light_threshold),
            ("soilSalinityThreshold", self.soil_salinity_threshold),
            ("idealSoilSalinity", self.ideal_soil_salinity),
        ];
        for (name, value) in values.iter() {
            if !value.is_finite() {
                return Err(CoreError::InvalidSettings(format!("{} is not finite", name)));
            }
        }
        if self.ideal_temperature > self.temperature_threshold {
            return Err(CoreError::InvalidSettings(
                "idealTemperature exceeds temperatureThreshold".to_owned(),
            ));
        }
        if self.ideal_soil_salinity > self.soil_salinity_threshold {
            return Err(CoreError::InvalidSettings(
                "idealSoilSalinity exceeds soilSalinityThreshold".to_owned(),
            ));
        }
        validate_speed(self.fan_speed)?;
        validate_speed(self.pump_speed)
    }
}

pub fn validate_speed(speed: u8) -> Result<(), CoreError> {
    if speed > 100 {
        return Err(CoreError::InvalidSettings(format!(
            "speed {} is not within 0-100",
            speed
        )));
    }
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub enum Device {
    Fan,
    GrowLight,
    Pump,
}

impl Device {
    pub const ALL: [Device; 3] = [Device::Fan, Device::GrowLight, Device::Pump];

    /// Name used in log entries
    pub fn label(&self) -> &'static str {
        match self {
            Device::Fan => "风扇",
            Device::GrowLight => "生长灯",
            Device::Pump => "水泵",
        }
    }

    /// Control proxy endpoint switching the device
    pub fn switch_command(&self, on: bool) -> &'static str {
        match (self, on) {
            (Device::Fan, true) => "stft",
            (Device::Fan, false) => "stff",
            (Device::GrowLight, true) => "stgt",
            (Device::GrowLight, false) => "stgf",
            (Device::Pump, true) => "stpt",
            (Device::Pump, false) => "stpf",
        }
    }

    /// Control proxy endpoint setting the speed, the grow light has none
    pub fn speed_command(&self, speed: u8) -> Option<String> {
        match self {
            Device::Fan => Some(format!("setFanSpeed/{}", speed)),
            Device::Pump => Some(format!("setPumpSpeed/{}", speed)),
            Device::GrowLight => None,
        }
    }

    pub fn status_column(&self) -> &'static str {
        match self {
            Device::Fan => "风扇状态",
            Device::GrowLight => "生长灯状态",
            Device::Pump => "水泵状态",
        }
    }

    pub fn speed_column(&self) -> Option<&'static str> {
        match self {
            Device::Fan => Some("风扇速度"),
            Device::Pump => Some("水泵速度"),
            Device::GrowLight => None,
        }
    }
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A control proxy command, as found in a forwarded request path
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Switch(Device, bool),
    Speed(Device, u8),
}

impl Command {
    pub fn parse(path: &str) -> Option<Command> {
        let path = path.trim_matches('/');
        let switch = Device::ALL.iter().find_map(|device| {
            [true, false]
                .iter()
                .find(|on| device.switch_command(**on) == path)
                .map(|on| Command::Switch(*device, *on))
        });
        if switch.is_some() {
            return switch;
        }

        let (endpoint, value) = path.split_once('/')?;
        let device = match endpoint {
            "setFanSpeed" => Device::Fan,
            "setPumpSpeed" => Device::Pump,
            _ => return None,
        };
        let speed = value.parse::<u8>().ok().filter(|s| *s <= 100)?;
        Some(Command::Speed(device, speed))
    }

    pub fn device(&self) -> Device {
        match self {
            Command::Switch(device, _) | Command::Speed(device, _) => *device,
        }
    }

    /// Proxy endpoint the command is sent to
    pub fn path(&self) -> String {
        match self {
            Command::Switch(device, on) => device.switch_command(*on).to_owned(),
            Command::Speed(device, speed) => device.speed_command(*speed).unwrap_or_default(),
        }
    }

    pub fn entry(&self, auto: bool, success: bool) -> LogEntry {
        match self {
            Command::Switch(device, on) => command_entry(*device, *on, auto, success),
            Command::Speed(device, speed) => speed_entry(*device, *speed, auto, success),
        }
    }
}

/// Log entry for a command that was issued through the dashboard
/// or the control proxy route
pub fn command_entry(device: Device, on: bool, auto: bool, success: bool) -> LogEntry {
    let origin = if auto { AUTO } else { MANUAL };
    let state = switch_label(on);
    let action = format!("{}-{}{}", origin, device.label(), state);
    if success {
        LogEntry::new(LogLevel::Success, action)
            .device(device.label())
            .status(state)
            .details(format!("已{}{}", state, device.label()))
    } else {
        LogEntry::new(LogLevel::Error, action)
            .device(device.label())
            .status("失败")
            .details(format!("{}{}失败", device.label(), state))
    }
}

pub fn speed_entry(device: Device, speed: u8, auto: bool, success: bool) -> LogEntry {
    let origin = if auto { AUTO } else { MANUAL };
    let action = format!("{}-{}速度设置", origin, device.label());
    if success {
        LogEntry::new(LogLevel::Success, action)
            .device(device.label())
            .status(format!("{}%", speed))
            .details(format!("{}速度已设置为{}%", device.label(), speed))
    } else {
        LogEntry::new(LogLevel::Error, action)
            .device(device.label())
            .status("失败")
            .details(format!("{}速度设置为{}%失败", device.label(), speed))
    }
}

fn switch_label(on: bool) -> &'static str {
    if on {
        "开启"
    } else {
        "关闭"
    }
}

/// Actuator state as reported by the control node
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, ToSchema)]
pub struct DeviceStatus {
    pub fan: bool,
    pub light: bool,
    pub pump: bool,
}

impl From<&CnsRecord> for DeviceStatus {
    fn from(record: &CnsRecord) -> Self {
        DeviceStatus {
            fan: parse_switch(&record.fan_status),
            light: parse_switch(&record.light_status),
            pump: parse_switch(&record.pump_status),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Action {
    TurnOn,
    TurnOff,
    /// Device keeps its state because it already is where it should be
    Hold(Hold),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Hold {
    /// Reading calls for the device and it already runs
    AlreadyOn,
    /// Reading is fine and the device already is off
    AlreadyOff,
    /// Reading lies between ideal and threshold
    InRange { on: bool },
}

/// Outcome of judging one device against its reading
#[derive(Debug, Clone, PartialEq)]
pub struct Decision {
    pub device: Device,
    pub reading: f64,
    pub threshold: f64,
    /// Switch-off bound, the grow light uses its threshold for both directions
    pub ideal: Option<f64>,
    /// Speed to apply after switching on
    pub speed: Option<u8>,
    pub action: Action,
}

/// `T >= threshold` switches the fan on, `T <= ideal` switches it off
pub fn decide_fan(temperature: f64, fan_on: bool, settings: &AutoControlSettings) -> Decision {
    let action = hysteresis(
        temperature,
        fan_on,
        settings.temperature_threshold,
        settings.ideal_temperature,
    );
    Decision {
        device: Device::Fan,
        reading: temperature,
        threshold: settings.temperature_threshold,
        ideal: Some(settings.ideal_temperature),
        speed: Some(settings.fan_speed),
        action,
    }
}

/// `L < threshold` switches the light on, `L >= threshold` switches it off
pub fn decide_light(light: f64, light_on: bool, settings: &AutoControlSettings) -> Decision {
    let threshold = settings.light_threshold;
    let action = if light < threshold {
        if light_on {
            Action::Hold(Hold::AlreadyOn)
        } else {
            Action::TurnOn
        }
    } else if light_on {
        Action::TurnOff
    } else {
        Action::Hold(Hold::AlreadyOff)
    };
    Decision {
        device: Device::GrowLight,
        reading: light,
        threshold,
        ideal: None,
        speed: None,
        action,
    }
}

/// Same bounds as the fan, driven by the soil salinity
pub fn decide_pump(salinity: f64, pump_on: bool, settings: &AutoControlSettings) -> Decision {
    let action = hysteresis(
        salinity,
        pump_on,
        settings.soil_salinity_threshold,
        settings.ideal_soil_salinity,
    );
    Decision {
        device: Device::Pump,
        reading: salinity,
        threshold: settings.soil_salinity_threshold,
        ideal: Some(settings.ideal_soil_salinity),
        speed: Some(settings.pump_speed),
        action,
    }
}

fn hysteresis(value: f64, on: bool, threshold: f64, ideal: f64) -> Action {
    if value >= threshold && !on {
        Action::TurnOn
    } else if value <= ideal && on {
        Action::TurnOff
    } else if value >= threshold {
        Action::Hold(Hold::AlreadyOn)
    } else if value <= ideal {
        Action::Hold(Hold::AlreadyOff)
    } else {
        Action::Hold(Hold::InRange { on })
    }
}

/// Judges all three devices. A reading that is not a number only
/// affects its own device.
pub fn plan(
    dns: &DnsRecord,
    dns2: &Dns2Record,
    status: DeviceStatus,
    settings: &AutoControlSettings,
) -> Vec<Result<Decision, CoreError>> {
    vec![
        parse_number("室内温度", &dns.indoor_temperature)
            .map(|t| decide_fan(t, status.fan, settings)),
        parse_number("光照强度", &dns.light_intensity)
            .map(|l| decide_light(l, status.light, settings)),
        parse_number("土壤盐度", &dns2.soil_salinity)
            .map(|s| decide_pump(s, status.pump, settings)),
    ]
}

/// Warning written when the loop is enabled but lacks readings
pub fn not_executed_entry(has_dns: bool, has_dns2: bool) -> Option<LogEntry> {
    let reason = match (has_dns, has_dns2) {
        (true, true) => return None,
        (false, false) => "检测数据和土壤数据均未获取到",
        (false, true) => "检测数据未获取到",
        (true, false) => "土壤数据未获取到",
    };
    Some(
        LogEntry::new(LogLevel::Warning, format!("{}-未执行", AUTO))
            .status("跳过")
            .details(format!(
                "自动控制功能已启用，但{}，无法执行自动控制逻辑",
                reason
            )),
    )
}

/// Warning written when a reading cannot be judged
pub fn skipped_entry(err: &CoreError) -> LogEntry {
    LogEntry::new(LogLevel::Warning, format!("{}-数据异常", AUTO))
        .status("跳过")
        .details(format!("{}，本轮不控制对应设备", err))
}

struct Texts {
    metric: &'static str,
    unit: &'static str,
    ideal_name: &'static str,
}

impl Decision {
    fn texts(&self) -> Texts {
        match self.device {
            Device::Fan => Texts {
                metric: "温度",
                unit: "°C",
                ideal_name: "理想温度",
            },
            Device::GrowLight => Texts {
                metric: "光照强度",
                unit: "lx",
                ideal_name: "设定阈值",
            },
            Device::Pump => Texts {
                metric: "土壤盐度",
                unit: "g/kg",
                ideal_name: "理想盐度",
            },
        }
    }

    fn ideal_or_threshold(&self) -> f64 {
        self.ideal.unwrap_or(self.threshold)
    }

    /// The state the device should be in after this decision
    pub fn target(&self) -> Option<bool> {
        match self.action {
            Action::TurnOn => Some(true),
            Action::TurnOff => Some(false),
            Action::Hold(_) => None,
        }
    }

    /// Entry written before a command is sent, or the only entry of a hold
    pub fn detected_entry(&self) -> LogEntry {
        let t = self.texts();
        let device = self.device.label();
        let (r, th, ideal) = (self.reading, self.threshold, self.ideal_or_threshold());
        match (self.device, self.action) {
            (Device::GrowLight, Action::TurnOn) => {
                LogEntry::new(LogLevel::Warning, format!("{}-光照阈值", AUTO))
                    .device(device)
                    .status("检测")
                    .details(format!(
                        "{}({}{})低于设定阈值({}{})，正在尝试开启{}",
                        t.metric, r, t.unit, th, t.unit, device
                    ))
            }
            (Device::GrowLight, Action::TurnOff) => {
                LogEntry::new(LogLevel::Info, format!("{}-光照充足", AUTO))
                    .device(device)
                    .status("检测")
                    .details(format!(
                        "{}({}{})已达到设定阈值({}{})，正在尝试关闭{}",
                        t.metric, r, t.unit, th, t.unit, device
                    ))
            }
            (Device::GrowLight, Action::Hold(Hold::AlreadyOn)) => {
                LogEntry::new(LogLevel::Info, format!("{}-光照不足", AUTO))
                    .device(device)
                    .status("已运行")
                    .details(format!(
                        "当前{}{}{}低于设定阈值{}{}，{}已处于开启状态",
                        t.metric, r, t.unit, th, t.unit, device
                    ))
            }
            (Device::GrowLight, Action::Hold(_)) => {
                LogEntry::new(LogLevel::Info, format!("{}-光照充足", AUTO))
                    .device(device)
                    .status("已关闭")
                    .details(format!(
                        "当前{}{}{}高于设定阈值{}{}，{}已处于关闭状态",
                        t.metric, r, t.unit, th, t.unit, device
                    ))
            }
            (_, Action::TurnOn) => {
                LogEntry::new(LogLevel::Warning, format!("{}-{}阈值", AUTO, self.short_metric()))
                    .device(device)
                    .status("检测")
                    .details(format!(
                        "{}({}{})已超过设定阈值({}{})，正在尝试开启{}",
                        t.metric, r, t.unit, th, t.unit, device
                    ))
            }
            (_, Action::TurnOff) => {
                LogEntry::new(LogLevel::Info, format!("{}-{}理想", AUTO, self.short_metric()))
                    .device(device)
                    .status("检测")
                    .details(format!(
                        "{}({}{})已达到{}({}{})，正在尝试关闭{}",
                        t.metric, r, t.unit, t.ideal_name, ideal, t.unit, device
                    ))
            }
            (_, Action::Hold(Hold::AlreadyOn)) => LogEntry::new(
                LogLevel::Info,
                format!("{}-{}超阈值", AUTO, self.short_metric()),
            )
            .device(device)
            .status("已运行")
            .details(format!(
                "当前{}{}{}超过设定阈值{}{}，{}已处于开启状态",
                t.metric, r, t.unit, th, t.unit, device
            )),
            (_, Action::Hold(Hold::AlreadyOff)) => LogEntry::new(
                LogLevel::Info,
                format!("{}-{}低于理想", AUTO, self.short_metric()),
            )
            .device(device)
            .status("已关闭")
            .details(format!(
                "当前{}{}{}低于{}{}{}或等于{}，{}已处于关闭状态",
                t.metric, r, t.unit, t.ideal_name, ideal, t.unit, t.ideal_name, device
            )),
            (_, Action::Hold(Hold::InRange { on })) => LogEntry::new(
                LogLevel::Info,
                format!("{}-{}正常", AUTO, self.short_metric()),
            )
            .device(device)
            .status("无需操作")
            .details(format!(
                "当前{}{}{}在设定范围内({}{}-{}{})，{}状态保持{}",
                t.metric,
                r,
                t.unit,
                ideal,
                t.unit,
                th,
                t.unit,
                device,
                switch_label(on)
            )),
        }
    }

    /// Entry written after the control proxy confirmed the command
    pub fn completed_entry(&self) -> LogEntry {
        let t = self.texts();
        let device = self.device.label();
        let (r, th, ideal) = (self.reading, self.threshold, self.ideal_or_threshold());
        let on = self.target().unwrap_or(false);
        let details = match (self.device, on) {
            (Device::GrowLight, true) => format!(
                "当前{}{}{}低于阈值{}{}，自动开启{}",
                t.metric, r, t.unit, th, t.unit, device
            ),
            (Device::GrowLight, false) => format!(
                "当前{}{}{}已达到设定阈值{}{}，自动关闭{}",
                t.metric, r, t.unit, th, t.unit, device
            ),
            (_, true) => format!(
                "当前{}{}{}超过阈值{}{}，自动开启{}，速度设置为{}%",
                t.metric,
                r,
                t.unit,
                th,
                t.unit,
                device,
                self.speed.unwrap_or(0)
            ),
            (_, false) => format!(
                "当前{}{}{}已达到{}{}{}，自动关闭{}",
                t.metric, r, t.unit, t.ideal_name, ideal, t.unit, device
            ),
        };
        LogEntry::new(
            LogLevel::Success,
            format!("{}-{}{}", AUTO, switch_label(on), device),
        )
        .device(device)
        .status(switch_label(on))
        .details(details)
    }

    /// Entry written after every attempt to reach the control proxy failed
    pub fn failed_entry(&self) -> LogEntry {
        let device = self.device.label();
        let state = switch_label(self.target().unwrap_or(false));
        LogEntry::new(LogLevel::Error, format!("{}-{}{}", AUTO, state, device))
            .device(device)
            .status("失败")
            .details(format!(
                "尝试自动{}{}失败，请检查设备连接或手动控制",
                state, device
            ))
    }

    fn short_metric(&self) -> &'static str {
        match self.device {
            Device::Fan => "温度",
            Device::GrowLight => "光照",
            Device::Pump => "盐度",
        }
    }
}

#[cfg(test)]
mod test;
