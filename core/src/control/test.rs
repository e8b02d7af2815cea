use super::*;
use crate::readings::{Dataset, Record};
use chrono::Utc;

fn settings() -> AutoControlSettings {
    AutoControlSettings::default()
}

fn readings(temperature: &str, light: &str, salinity: &str) -> (DnsRecord, Dns2Record) {
    let now = Utc::now();
    let mut dns = match Record::fallback(Dataset::Dns, now) {
        Record::Dns(r) => r,
        _ => unreachable!(),
    };
    let mut dns2 = match Record::fallback(Dataset::Dns2, now) {
        Record::Dns2(r) => r,
        _ => unreachable!(),
    };
    dns.indoor_temperature = temperature.to_owned();
    dns.light_intensity = light.to_owned();
    dns2.soil_salinity = salinity.to_owned();
    (dns, dns2)
}

#[test]
fn test_default_settings() {
    let settings = settings();

    assert_eq!(settings.temperature_threshold, 28.0);
    assert_eq!(settings.ideal_temperature, 24.0);
    assert_eq!(settings.fan_speed, 80);
    assert_eq!(settings.light_threshold, 500.0);
    assert_eq!(settings.soil_salinity_threshold, 8.0);
    assert_eq!(settings.ideal_soil_salinity, 5.0);
    assert_eq!(settings.pump_speed, 70);
    assert!(settings.validate().is_ok());
}

#[test]
fn test_settings_camel_case() {
    let json = serde_json::to_value(settings()).unwrap();

    assert_eq!(json["temperatureThreshold"], 28.0);
    assert_eq!(json["soilSalinityThreshold"], 8.0);
    assert_eq!(json["pumpSpeed"], 70);
}

#[test]
fn test_validate_settings() {
    let mut invalid = settings();
    invalid.ideal_temperature = 30.0;
    assert!(invalid.validate().is_err());

    let mut invalid = settings();
    invalid.ideal_soil_salinity = 9.0;
    assert!(invalid.validate().is_err());

    let mut invalid = settings();
    invalid.fan_speed = 101;
    assert!(invalid.validate().is_err());

    let mut invalid = settings();
    invalid.light_threshold = f64::INFINITY;
    assert!(invalid.validate().is_err());
}

#[test]
fn test_fan_hysteresis() {
    let settings = settings();

    assert_eq!(decide_fan(28.0, false, &settings).action, Action::TurnOn);
    assert_eq!(decide_fan(31.5, false, &settings).action, Action::TurnOn);
    assert_eq!(
        decide_fan(31.5, true, &settings).action,
        Action::Hold(Hold::AlreadyOn)
    );
    assert_eq!(
        decide_fan(26.0, true, &settings).action,
        Action::Hold(Hold::InRange { on: true })
    );
    assert_eq!(
        decide_fan(26.0, false, &settings).action,
        Action::Hold(Hold::InRange { on: false })
    );
    assert_eq!(decide_fan(24.0, true, &settings).action, Action::TurnOff);
    assert_eq!(
        decide_fan(20.0, false, &settings).action,
        Action::Hold(Hold::AlreadyOff)
    );
}

#[test]
fn test_light_threshold() {
    let settings = settings();

    assert_eq!(decide_light(499.0, false, &settings).action, Action::TurnOn);
    assert_eq!(
        decide_light(499.0, true, &settings).action,
        Action::Hold(Hold::AlreadyOn)
    );
    assert_eq!(decide_light(500.0, true, &settings).action, Action::TurnOff);
    assert_eq!(
        decide_light(800.0, false, &settings).action,
        Action::Hold(Hold::AlreadyOff)
    );
}

#[test]
fn test_pump_salinity() {
    let settings = settings();

    let decision = decide_pump(8.5, false, &settings);
    assert_eq!(decision.action, Action::TurnOn);
    assert_eq!(decision.speed, Some(70));
    assert_eq!(decide_pump(5.0, true, &settings).action, Action::TurnOff);
    assert_eq!(
        decide_pump(6.0, true, &settings).action,
        Action::Hold(Hold::InRange { on: true })
    );
}

#[test]
fn test_plan_is_independent_per_device() {
    // Prepare
    let (dns, dns2) = readings("30.0", "abc", "9.1");
    let status = DeviceStatus {
        fan: false,
        light: false,
        pump: true,
    };

    // Execute
    let decisions = plan(&dns, &dns2, status, &settings());

    // Validate
    assert_eq!(decisions.len(), 3);
    let fan = decisions[0].as_ref().unwrap();
    assert_eq!(fan.device, Device::Fan);
    assert_eq!(fan.action, Action::TurnOn);
    assert_eq!(fan.target(), Some(true));
    assert_eq!(
        decisions[1],
        Err(CoreError::InvalidValue("光照强度".to_owned(), "abc".to_owned()))
    );
    let pump = decisions[2].as_ref().unwrap();
    assert_eq!(pump.action, Action::Hold(Hold::AlreadyOn));
    assert_eq!(pump.target(), None);
}

#[test]
fn test_device_status_from_record() {
    let mut record = match Record::fallback(Dataset::Cns, Utc::now()) {
        Record::Cns(r) => r,
        _ => unreachable!(),
    };
    record.fan_status = "TRUE".to_owned();
    record.pump_status = "0".to_owned();

    let status = DeviceStatus::from(&record);

    assert!(status.fan);
    assert!(status.light);
    assert!(!status.pump);
}

#[test]
fn test_device_commands() {
    assert_eq!(Device::Fan.switch_command(true), "stft");
    assert_eq!(Device::Fan.switch_command(false), "stff");
    assert_eq!(Device::GrowLight.switch_command(true), "stgt");
    assert_eq!(Device::GrowLight.switch_command(false), "stgf");
    assert_eq!(Device::Pump.switch_command(true), "stpt");
    assert_eq!(Device::Pump.switch_command(false), "stpf");
    assert_eq!(Device::Fan.speed_command(80), Some("setFanSpeed/80".to_owned()));
    assert_eq!(Device::Pump.speed_command(5), Some("setPumpSpeed/5".to_owned()));
    assert_eq!(Device::GrowLight.speed_command(5), None);
}

#[test]
fn test_decision_entries() {
    let settings = settings();
    let decision = decide_fan(30.0, false, &settings);

    let detected = decision.detected_entry();
    assert_eq!(detected.action, "自动控制-温度阈值");
    assert_eq!(detected.level, LogLevel::Warning);
    assert_eq!(
        detected.details.as_deref(),
        Some("温度(30°C)已超过设定阈值(28°C)，正在尝试开启风扇")
    );

    let completed = decision.completed_entry();
    assert_eq!(completed.action, "自动控制-开启风扇");
    assert_eq!(completed.level, LogLevel::Success);
    assert_eq!(
        completed.details.as_deref(),
        Some("当前温度30°C超过阈值28°C，自动开启风扇，速度设置为80%")
    );

    let failed = decision.failed_entry();
    assert_eq!(failed.action, "自动控制-开启风扇");
    assert_eq!(failed.level, LogLevel::Error);
    assert_eq!(failed.status.as_deref(), Some("失败"));

    let hold = decide_fan(26.0, true, &settings).detected_entry();
    assert_eq!(hold.action, "自动控制-温度正常");
    assert_eq!(
        hold.details.as_deref(),
        Some("当前温度26°C在设定范围内(24°C-28°C)，风扇状态保持开启")
    );

    let light = decide_light(800.0, true, &settings).completed_entry();
    assert_eq!(light.action, "自动控制-关闭生长灯");
}

#[test]
fn test_not_executed_entry() {
    assert!(not_executed_entry(true, true).is_none());
    let entry = not_executed_entry(false, true).unwrap();
    assert_eq!(entry.action, "自动控制-未执行");
    assert_eq!(entry.level, LogLevel::Warning);
    assert_eq!(
        entry.details.as_deref(),
        Some("自动控制功能已启用，但检测数据未获取到，无法执行自动控制逻辑")
    );
    assert!(not_executed_entry(false, false)
        .unwrap()
        .details
        .unwrap()
        .contains("检测数据和土壤数据均未获取到"));
}

#[test]
fn test_command_entries() {
    let entry = command_entry(Device::GrowLight, true, false, true);
    assert_eq!(entry.action, "手动控制-生长灯开启");
    assert_eq!(entry.level, LogLevel::Success);

    let entry = command_entry(Device::Pump, false, true, false);
    assert_eq!(entry.action, "自动控制-水泵关闭");
    assert_eq!(entry.level, LogLevel::Error);

    let entry = speed_entry(Device::Fan, 60, false, true);
    assert_eq!(entry.action, "手动控制-风扇速度设置");
    assert_eq!(entry.status.as_deref(), Some("60%"));
}

#[test]
fn test_parse_command() {
    assert_eq!(Command::parse("stft"), Some(Command::Switch(Device::Fan, true)));
    assert_eq!(
        Command::parse("/stgf"),
        Some(Command::Switch(Device::GrowLight, false))
    );
    assert_eq!(
        Command::parse("setPumpSpeed/45"),
        Some(Command::Speed(Device::Pump, 45))
    );
    assert_eq!(Command::parse("setPumpSpeed/450"), None);
    assert_eq!(Command::parse("setLightSpeed/4"), None);
    assert_eq!(Command::parse(""), None);
    assert_eq!(Command::parse("stxx"), None);

    let entry = Command::parse("stpt").unwrap().entry(false, true);
    assert_eq!(entry.action, "手动控制-水泵开启");
    assert_eq!(Command::parse("stpt").unwrap().device(), Device::Pump);
}

#[test]
fn test_command_path() {
    assert_eq!(Command::parse("/stgf/").unwrap().path(), "stgf");
    assert_eq!(
        Command::Speed(Device::Fan, 30).path(),
        "setFanSpeed/30"
    );
}
