use fomu_captouch::{
    captouch::{self, CapTouch, Config, Pads, Register, DEFAULT_PERIOD, PADS},
    csr::{CsrBus, Layout, CSR_STRIDE, TOUCH_BASE},
    driver::Touch,
    settings::Settings,
    soc::Soc,
    tristate::RcPad,
};

use arbitrary_int::u2;

fn bank(pads: [RcPad; PADS], config: Config) -> Touch<Soc<RcPad>> {
    let soc = Soc::new(CapTouch::new(pads, config).unwrap(), TOUCH_BASE);
    Touch::new(soc, TOUCH_BASE, config.period_width).unwrap()
}

#[test]
fn poll_counts() {
    let mut touch = bank([RcPad::new(6, 20); PADS], Config::default());
    touch.bus_mut().touch_mut().pad_mut(u2::new(1)).set_touched(true);

    touch.set_capen(Pads::from_bits(0xf)).unwrap();
    touch.set_period(999).unwrap();
    assert_eq!(touch.period().unwrap(), 999);
    assert_eq!(touch.capen().unwrap().bits(), 0xf);

    // The first window uses the reset period
    assert!(touch.bus_mut().run(DEFAULT_PERIOD).unwrap().is_none());
    assert!(touch.bus_mut().run(1).unwrap().is_some());
    touch.bus_mut().run(1000).unwrap();

    let [c1, c2, c3, c4] = touch.counts().unwrap();
    assert_eq!(c1, c3);
    assert_eq!(c1, c4);
    assert!(c1 > 100, "{c1}");
    assert!(c2 < c1 / 2, "{c2} {c1}");
    assert_eq!(touch.count(u2::new(1)).unwrap(), c2);
}

#[test]
fn gpio_round_trip() {
    let mut touch = bank([RcPad::loopback(); PADS], Config::default());
    touch.set_output(Pads::from_bits(0b1010)).unwrap();
    touch.set_output_enable(Pads::from_bits(0b1111)).unwrap();
    touch.bus_mut().run(1).unwrap();
    assert_eq!(touch.input().unwrap().bits(), 0b1010);
    assert_eq!(touch.output().unwrap().bits(), 0b1010);
    assert_eq!(touch.output_enable().unwrap().bits(), 0b1111);
}

#[test]
fn period_subregisters() {
    let mut touch = bank([RcPad::default(); PADS], Config::default());
    touch.set_period(0x0102_0304).unwrap();
    let cper = TOUCH_BASE + Layout::default().offset(Register::Cper);
    let soc = touch.bus_mut();
    for (i, byte) in [1, 2, 3, 4].into_iter().enumerate() {
        assert_eq!(soc.read8(cper + i as u32 * CSR_STRIDE).unwrap(), byte);
    }
    // Single lane update
    soc.write8(cper + 3 * CSR_STRIDE, 0xff).unwrap();
    assert_eq!(soc.touch().read(Register::Cper), 0x0102_03ff);
}

#[test]
fn narrow_period() {
    let config = Config {
        period_width: 20,
        period: 0xf_ffff,
        legacy: false,
    };
    let mut touch = bank([RcPad::default(); PADS], config);
    touch.set_period(0xabcde).unwrap();
    assert_eq!(touch.period().unwrap(), 0xabcde);
    assert_eq!(touch.bus().layout().offset(Register::C1), 0x1c);
    assert_eq!(touch.counts().unwrap(), [0; PADS]);
}

#[test]
fn period_width_validated() {
    for width in [0, 33, 40] {
        let soc = Soc::new(
            CapTouch::new([RcPad::default(); PADS], Config::default()).unwrap(),
            TOUCH_BASE,
        );
        assert_eq!(
            Touch::new(soc, TOUCH_BASE, width).err(),
            Some(captouch::Error::PeriodWidth(width))
        );
    }
}

#[test]
fn status_writes_dropped() {
    let mut touch = bank(
        [RcPad::default(); PADS],
        Config {
            period: 3,
            ..Default::default()
        },
    );
    touch.set_capen(Pads::from_bits(0b0001)).unwrap();
    touch.bus_mut().run(4).unwrap();
    let c1 = touch.count(u2::new(0)).unwrap();
    assert_eq!(c1, 2);

    let layout = touch.bus().layout();
    let soc = touch.bus_mut();
    soc.write8(TOUCH_BASE + layout.offset(Register::C1), 0x55)
        .unwrap();
    soc.write8(TOUCH_BASE + layout.offset(Register::I), 0x0f)
        .unwrap();
    soc.write8(TOUCH_BASE + layout.size(), 0x0f).unwrap();
    assert_eq!(soc.read8(TOUCH_BASE + layout.size()).unwrap(), 0);
    assert_eq!(soc.read8(TOUCH_BASE - CSR_STRIDE).unwrap(), 0);
    assert_eq!(touch.count(u2::new(0)).unwrap(), c1);
    assert_eq!(touch.input().unwrap().bits(), 0);
}

#[test]
fn settings() {
    let mut touch = bank([RcPad::loopback(); PADS], Config::default());
    let (settings, _) = serde_json_core::from_str::<Settings>(
        r#"{"capen":[true,false,true,false],"period":1000,"output":[false,true,false,false],"output_enable":[false,true,false,false]}"#,
    )
    .unwrap();
    settings.apply(&mut touch).unwrap();
    assert_eq!(touch.bus().touch().capen().bits(), 0b0101);
    assert_eq!(touch.bus().touch().read(Register::Cper), 1000);
    assert_eq!(Settings::load(&mut touch).unwrap(), settings);

    touch.bus_mut().run(1).unwrap();
    assert_eq!(touch.input().unwrap().bits(), 0b0010);

    Settings::default().apply(&mut touch).unwrap();
    assert_eq!(touch.capen().unwrap().bits(), 0);
    assert_eq!(touch.period().unwrap(), DEFAULT_PERIOD);
}
